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

//! mysql_command notifier plugin
//!
//! This plugin implements a notification service whose message is a SQL
//! statement. Each notification opens a connection to a MySQL-compatible
//! database, executes the statement (binding the notification target as
//! positional parameters), commits, and closes the connection.
//!
//! # Security
//!
//! The message is executed verbatim. There is no allow-list and no
//! sanitisation; anyone able to send a notification through this service
//! can run arbitrary SQL as the configured database user. Grant that user
//! only the privileges the intended statements need.
//!
//! # Example
//!
//! ```rust,ignore
//! use drasi_notifier_mysql_command::{
//!     ConnectionConfig, MySqlCommandNotificationService, NotificationService,
//! };
//! use serde_json::json;
//!
//! let config = ConnectionConfig::builder()
//!     .with_host("localhost")
//!     .with_username("homeassistant")
//!     .with_password("password")
//!     .with_database("home")
//!     .build()?;
//!
//! let service = MySqlCommandNotificationService::new("mysql", config)?;
//! service
//!     .send_message(
//!         "UPDATE devices SET state = ? WHERE id = ?",
//!         Some(&[json!("on"), json!(42)][..]),
//!     )
//!     .await?;
//! ```

pub mod config;
pub mod config_value;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod executor;
pub mod service;


pub use config::ConnectionConfig;
pub use descriptor::{get_service, MySqlCommandNotifierDescriptor, NotifierPluginDescriptor};
pub use driver::{DatabaseDriver, DriverConnection, StatementOutcome};
pub use error::{ConfigurationError, ConnectionError, DriverError, ExecutionError, NotifyError};
pub use executor::MySqlDriver;
pub use service::{MySqlCommandNotificationService, NotificationService};
