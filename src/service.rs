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

//! mysql_command notification service implementation.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::driver::{DatabaseDriver, DriverConnection, StatementOutcome};
use crate::error::{
    ConfigurationError, ConnectionError, ExecutionError, ExecutionStage, NotifyError,
};
use crate::executor::MySqlDriver;

/// Contract a host platform uses to deliver notifications.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Deliver `message`, optionally addressed to `target`.
    async fn send_message(&self, message: &str, target: Option<&[Value]>)
        -> Result<(), NotifyError>;
}

/// Notification service that runs each message as a SQL statement.
///
/// The message is executed as given. When a target is supplied its values
/// are bound positionally to the statement's `?` placeholders. Every send
/// opens its own connection and closes it before returning.
///
/// The statement text is not inspected, so whoever can send a notification
/// can run any SQL the configured user is allowed to run.
pub struct MySqlCommandNotificationService {
    id: String,
    config: Arc<ConnectionConfig>,
    driver: Arc<dyn DatabaseDriver>,
}

impl std::fmt::Debug for MySqlCommandNotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlCommandNotificationService")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}

impl MySqlCommandNotificationService {
    /// Create a builder for MySqlCommandNotificationService
    pub fn builder(id: impl Into<String>) -> MySqlCommandNotificationServiceBuilder {
        MySqlCommandNotificationServiceBuilder::new(id)
    }

    /// Create a service that talks to MySQL through [`MySqlDriver`]
    pub fn new(id: impl Into<String>, config: ConnectionConfig) -> Result<Self, NotifyError> {
        Ok(Self::builder(id).with_config(config).build()?)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open a cursor, execute and commit.
    ///
    /// Returns whether a cursor was opened alongside the outcome so the caller
    /// knows what to release.
    async fn run_statement(
        &self,
        connection: &mut dyn DriverConnection,
        message: &str,
        target: Option<&[Value]>,
    ) -> (bool, Result<StatementOutcome, ExecutionError>) {
        if let Err(source) = connection.open_cursor(self.config.buffered).await {
            return (
                false,
                Err(ExecutionError {
                    stage: ExecutionStage::OpenCursor,
                    source,
                }),
            );
        }

        match target {
            Some(params) => debug!(
                "[{}] Executing query: '{message}' with target {params:?}",
                self.id
            ),
            None => debug!("[{}] Executing query: '{message}'", self.id),
        }

        let outcome = match connection.execute(message, target).await {
            Ok(outcome) => outcome,
            Err(source) => {
                return (
                    true,
                    Err(ExecutionError {
                        stage: ExecutionStage::Execute,
                        source,
                    }),
                )
            }
        };

        if let Err(source) = connection.commit().await {
            return (
                true,
                Err(ExecutionError {
                    stage: ExecutionStage::Commit,
                    source,
                }),
            );
        }

        (true, Ok(outcome))
    }

    /// Close the cursor (if one was opened) and the connection.
    ///
    /// Failures here are logged only; they never replace the send's outcome.
    async fn release(&self, mut connection: Box<dyn DriverConnection>, cursor_open: bool) {
        if cursor_open {
            if let Err(e) = connection.close_cursor().await {
                warn!("[{}] Failed to close cursor: {e}", self.id);
            }
        }
        if let Err(e) = connection.close().await {
            warn!("[{}] Failed to close connection: {e}", self.id);
        }
    }
}

#[async_trait]
impl NotificationService for MySqlCommandNotificationService {
    async fn send_message(
        &self,
        message: &str,
        target: Option<&[Value]>,
    ) -> Result<(), NotifyError> {
        let mut connection = self.driver.connect(&self.config).await.map_err(|e| {
            error!(
                "[{}] Failed to connect to {}:{}/{}: {e}",
                self.id, self.config.host, self.config.port, self.config.database
            );
            ConnectionError(e)
        })?;

        let (cursor_open, result) = self
            .run_statement(connection.as_mut(), message, target)
            .await;
        self.release(connection, cursor_open).await;

        match result {
            Ok(outcome) => {
                debug!("[{}] {} row(s) affected", self.id, outcome.affected_rows);
                if let Some(rows) = outcome.buffered_rows {
                    debug!("[{}] {rows} row(s) buffered", self.id);
                }
                Ok(())
            }
            Err(e) => {
                error!("[{}] {e}", self.id);
                Err(e.into())
            }
        }
    }
}

/// Builder for [`MySqlCommandNotificationService`]
pub struct MySqlCommandNotificationServiceBuilder {
    id: String,
    config: Option<ConnectionConfig>,
    driver: Option<Arc<dyn DatabaseDriver>>,
}

impl MySqlCommandNotificationServiceBuilder {
    /// Create a new builder with the given service ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: None,
            driver: None,
        }
    }

    /// Set the connection configuration
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a different database driver (defaults to [`MySqlDriver`])
    pub fn with_driver(mut self, driver: Arc<dyn DatabaseDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Build the MySqlCommandNotificationService
    pub fn build(self) -> Result<MySqlCommandNotificationService, ConfigurationError> {
        let config = self
            .config
            .ok_or_else(|| ConfigurationError::missing("config"))?;
        config.validate()?;

        info!(
            "[{}] Created mysql_command notifier for {}:{}/{}",
            self.id, config.host, config.port, config.database
        );

        Ok(MySqlCommandNotificationService {
            id: self.id,
            config: Arc::new(config),
            driver: self.driver.unwrap_or_else(|| Arc::new(MySqlDriver::new())),
        })
    }
}
