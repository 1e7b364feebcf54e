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

//! Database driver abstraction used by the notifier.
//!
//! The notifier only needs a small slice of a database driver: connect,
//! open a cursor, execute one statement, commit, and close. These traits
//! describe that slice so the send sequence can run against
//! [`MySqlDriver`](crate::executor::MySqlDriver) in production and against
//! a recording driver in tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::error::DriverError;

/// What a single `execute` reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementOutcome {
    /// Rows inserted, updated or deleted
    pub affected_rows: u64,

    /// Rows fetched client-side, only reported by buffered cursors
    pub buffered_rows: Option<usize>,

    /// Auto-increment id generated by the statement, if any
    pub last_insert_id: Option<u64>,
}

/// Opens connections to the database.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Open a new connection.
    ///
    /// Implementations must give up once `config.connect_timeout()` has elapsed.
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DriverConnection>, DriverError>;
}

/// A single open connection, owned by one send.
#[async_trait]
pub trait DriverConnection: Send {
    /// Open the cursor that the statement is executed on.
    async fn open_cursor(&mut self, buffered: bool) -> Result<(), DriverError>;

    /// Execute `statement` on the open cursor.
    ///
    /// With `Some(params)` the statement is run as a parameterized statement
    /// and `params` are bound positionally. With `None` it is sent verbatim.
    async fn execute(
        &mut self,
        statement: &str,
        params: Option<&[Value]>,
    ) -> Result<StatementOutcome, DriverError>;

    /// Commit the transaction opened by `execute`.
    async fn commit(&mut self) -> Result<(), DriverError>;

    /// Close the cursor.
    async fn close_cursor(&mut self) -> Result<(), DriverError>;

    /// Close the connection. Uncommitted work is discarded.
    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}
