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

//! Error types for the mysql_command notifier.
//!
//! Three failure classes reach the host platform:
//!
//! - [`ConfigurationError`] is raised while building a [`ConnectionConfig`](crate::ConnectionConfig)
//!   and always names the offending field. Nothing touches the network before it is ruled out.
//! - [`ConnectionError`] is raised per send when the database cannot be reached.
//! - [`ExecutionError`] is raised per send when the statement (or its commit) fails.
//!   The connection has already been closed when it is returned.

use std::fmt;
use thiserror::Error;

/// Error reported by a [`DatabaseDriver`](crate::driver::DatabaseDriver).
///
/// Carries the server error code when the driver has one (e.g. `1064` for a
/// MySQL syntax error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub code: Option<u16>,
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for DriverError {}

/// Why a configuration field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationErrorReason {
    /// Required field is absent or null
    Missing,

    /// Required field is an empty string
    Empty,

    /// Field has a JSON type that cannot be coerced
    InvalidType { expected: &'static str },

    /// Field has the right type but an unusable value
    InvalidValue(String),

    /// `${VAR}` reference to an unset variable with no default
    UnresolvedReference { variable: String },
}

impl fmt::Display for ConfigurationErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "required option is missing"),
            Self::Empty => write!(f, "required option must not be empty"),
            Self::InvalidType { expected } => write!(f, "expected {expected}"),
            Self::InvalidValue(msg) => write!(f, "{msg}"),
            Self::UnresolvedReference { variable } => {
                write!(f, "environment variable '{variable}' is not set and has no default")
            }
        }
    }
}

/// Invalid or missing connection option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid configuration for '{field}': {reason}")]
pub struct ConfigurationError {
    pub field: &'static str,
    pub reason: ConfigurationErrorReason,
}

impl ConfigurationError {
    pub fn new(field: &'static str, reason: ConfigurationErrorReason) -> Self {
        Self { field, reason }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::new(field, ConfigurationErrorReason::Missing)
    }

    pub fn empty(field: &'static str) -> Self {
        Self::new(field, ConfigurationErrorReason::Empty)
    }

    pub fn invalid_type(field: &'static str, expected: &'static str) -> Self {
        Self::new(field, ConfigurationErrorReason::InvalidType { expected })
    }

    pub fn invalid_value(field: &'static str, msg: impl Into<String>) -> Self {
        Self::new(field, ConfigurationErrorReason::InvalidValue(msg.into()))
    }
}

/// The database could not be reached (refused, unreachable, auth rejected, timed out).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to connect to MySQL: {0}")]
pub struct ConnectionError(pub DriverError);

/// The step of a send that failed after the connection was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    OpenCursor,
    Execute,
    Commit,
}

impl fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenCursor => write!(f, "open cursor"),
            Self::Execute => write!(f, "execute statement"),
            Self::Commit => write!(f, "commit transaction"),
        }
    }
}

/// The statement failed at the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to {stage}: {source}")]
pub struct ExecutionError {
    pub stage: ExecutionStage,
    #[source]
    pub source: DriverError,
}

/// Any error the notifier surfaces to the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl NotifyError {
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_field() {
        let err = ConfigurationError::missing("host");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'host': required option is missing"
        );
    }

    #[test]
    fn test_driver_error_display_with_code() {
        let err = DriverError::with_code(1064, "You have an error in your SQL syntax");
        assert_eq!(err.to_string(), "1064: You have an error in your SQL syntax");
        assert_eq!(DriverError::new("boom").to_string(), "boom");
    }

    #[test]
    fn test_execution_error_display() {
        let err = NotifyError::from(ExecutionError {
            stage: ExecutionStage::Commit,
            source: DriverError::new("lock wait timeout"),
        });
        assert!(err.is_execution_error());
        assert!(!err.is_connection_error());
        assert_eq!(
            err.to_string(),
            "Failed to commit transaction: lock wait timeout"
        );
    }

    #[test]
    fn test_execution_error_display_per_stage() {
        let source = DriverError::with_code(2014, "Commands out of sync");
        let message = |stage| {
            ExecutionError {
                stage,
                source: source.clone(),
            }
            .to_string()
        };
        assert_eq!(
            message(ExecutionStage::OpenCursor),
            "Failed to open cursor: 2014: Commands out of sync"
        );
        assert_eq!(
            message(ExecutionStage::Execute),
            "Failed to execute statement: 2014: Commands out of sync"
        );
    }

    #[test]
    fn test_connection_error_classification() {
        let err = NotifyError::from(ConnectionError(DriverError::new("connection refused")));
        assert!(err.is_connection_error());
        assert!(err.to_string().contains("connection refused"));
    }
}
