// Copyright 2025 The Drasi Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! MySQL driver backed by `mysql_async`.

use async_trait::async_trait;
use log::debug;
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder, QueryResult, Row};
use serde_json::Value;
use tokio::time::timeout;

use crate::config::ConnectionConfig;
use crate::driver::{DatabaseDriver, DriverConnection, StatementOutcome};
use crate::error::DriverError;

/// Opens one `mysql_async` connection per call. No pooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDriver;

impl MySqlDriver {
    pub fn new() -> Self {
        Self
    }

    fn connection_opts(config: &ConnectionConfig) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(config.host.as_str())
            .tcp_port(config.port)
            .user(Some(config.username.as_str()))
            .pass(Some(config.password.as_str()))
            .db_name(Some(config.database.as_str()))
            // Statements run inside an implicit transaction that only commit() ends
            .init(vec!["SET autocommit = 0"])
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DriverConnection>, DriverError> {
        debug!(
            "Connecting to MySQL: {}:{}/{}",
            config.host, config.port, config.database
        );

        let connect_timeout = config.connect_timeout();
        let conn = timeout(connect_timeout, Conn::new(Self::connection_opts(config)))
            .await
            .map_err(|_| {
                DriverError::new(format!(
                    "Connection to {}:{} timed out after {connect_timeout:?}",
                    config.host, config.port
                ))
            })?
            .map_err(driver_error)?;

        Ok(Box::new(MySqlConnection { conn, cursor: None }))
    }
}

/// Cursor state for the one statement a connection runs.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    buffered: bool,
}

struct MySqlConnection {
    conn: Conn,
    cursor: Option<Cursor>,
}

impl MySqlConnection {
    fn cursor(&self) -> Result<Cursor, DriverError> {
        self.cursor
            .ok_or_else(|| DriverError::new("No open cursor on this connection"))
    }
}

#[async_trait]
impl DriverConnection for MySqlConnection {
    async fn open_cursor(&mut self, buffered: bool) -> Result<(), DriverError> {
        self.cursor = Some(Cursor { buffered });
        Ok(())
    }

    async fn execute(
        &mut self,
        statement: &str,
        params: Option<&[Value]>,
    ) -> Result<StatementOutcome, DriverError> {
        let cursor = self.cursor()?;

        match params {
            Some(params) => {
                let mysql_params: Vec<mysql_async::Value> =
                    params.iter().map(json_to_mysql_value).collect();
                let result = self
                    .conn
                    .exec_iter(statement, mysql_params)
                    .await
                    .map_err(driver_error)?;
                consume_result(result, cursor.buffered).await
            }
            None => {
                let result = self.conn.query_iter(statement).await.map_err(driver_error)?;
                consume_result(result, cursor.buffered).await
            }
        }
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.conn.query_drop("COMMIT").await.map_err(driver_error)
    }

    async fn close_cursor(&mut self) -> Result<(), DriverError> {
        self.cursor = None;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.conn.disconnect().await.map_err(driver_error)
    }
}

/// Read everything the server sent back for a statement.
///
/// Buffered cursors fetch every row of every result set into memory.
/// Unbuffered cursors drain and discard them.
async fn consume_result<P>(
    mut result: QueryResult<'_, 'static, P>,
    buffered: bool,
) -> Result<StatementOutcome, DriverError>
where
    P: Protocol,
{
    let affected_rows = result.affected_rows();
    let last_insert_id = result.last_insert_id();

    let buffered_rows = if buffered {
        let mut count = 0;
        while !result.is_empty() {
            let rows: Vec<Row> = result.collect().await.map_err(driver_error)?;
            count += rows.len();
        }
        Some(count)
    } else {
        result.drop_result().await.map_err(driver_error)?;
        None
    };

    Ok(StatementOutcome {
        affected_rows,
        buffered_rows,
        last_insert_id,
    })
}

fn driver_error(error: mysql_async::Error) -> DriverError {
    match error {
        mysql_async::Error::Server(server) => DriverError::with_code(server.code, server.message),
        other => DriverError::new(other.to_string()),
    }
}

/// Convert JSON value to MySQL Value
pub(crate) fn json_to_mysql_value(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Bool(b) => mysql_async::Value::Int(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                mysql_async::Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                mysql_async::Value::UInt(u)
            } else if let Some(f) = n.as_f64() {
                mysql_async::Value::Double(f)
            } else {
                mysql_async::Value::Bytes(n.to_string().into_bytes())
            }
        }
        Value::String(s) => mysql_async::Value::Bytes(s.as_bytes().to_vec()),
        // Lists and mappings are bound as their JSON text
        Value::Array(_) | Value::Object(_) => {
            mysql_async::Value::Bytes(value.to_string().into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(json_to_mysql_value(&json!(null)), mysql_async::Value::NULL);
        assert_eq!(json_to_mysql_value(&json!(true)), mysql_async::Value::Int(1));
        assert_eq!(json_to_mysql_value(&json!(42)), mysql_async::Value::Int(42));
        assert_eq!(json_to_mysql_value(&json!(-7)), mysql_async::Value::Int(-7));
        assert_eq!(
            json_to_mysql_value(&json!(u64::MAX)),
            mysql_async::Value::UInt(u64::MAX)
        );
        assert_eq!(
            json_to_mysql_value(&json!(21.5)),
            mysql_async::Value::Double(21.5)
        );
        assert_eq!(
            json_to_mysql_value(&json!("living room")),
            mysql_async::Value::Bytes(b"living room".to_vec())
        );
    }

    #[test]
    fn test_compound_values_bound_as_json_text() {
        assert_eq!(
            json_to_mysql_value(&json!([1, 2])),
            mysql_async::Value::Bytes(b"[1,2]".to_vec())
        );
        assert_eq!(
            json_to_mysql_value(&json!({"on": true})),
            mysql_async::Value::Bytes(br#"{"on":true}"#.to_vec())
        );
    }

    #[test]
    fn test_client_side_error_has_no_code() {
        let err = driver_error(mysql_async::Error::Other("socket closed".into()));
        assert_eq!(err.code, None);
        assert!(err.message.contains("socket closed"));
    }
}
