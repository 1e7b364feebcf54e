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

//! Connection configuration for the mysql_command notifier.
//!
//! The host platform hands the notifier a mapping of option names to JSON
//! values. [`ConnectionConfig::from_mapping`] validates that mapping, coerces
//! each option to its type and fills in defaults:
//!
//! | option     | required | default | type    |
//! |------------|----------|---------|---------|
//! | `host`     | yes      |         | string  |
//! | `port`     | no       | 3306    | integer |
//! | `username` | yes      |         | string  |
//! | `password` | yes      |         | string  |
//! | `database` | yes      |         | string  |
//! | `timeout`  | no       | 10      | integer (seconds) |
//! | `buffered` | no       | false   | boolean |
//!
//! Any option may also be a `${VAR}` reference (see [`crate::config_value`]).
//! Keys the notifier does not know (`platform`, `name`, ...) are ignored.
//!
//! Coercion is strict where a lossy reading is possible. Integer options take
//! JSON integers or integer strings, and reject fractions such as `2.5` rather
//! than truncating them. Zero and negative values are rejected. `buffered`
//! takes a boolean, `0`/`1`, or one of `true`/`false`, `yes`/`no`, `on`/`off`,
//! `enable`/`disable`; other numbers are rejected rather than read as `true`.

use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

use crate::config_value::{EnvironmentVariableResolver, ValueResolver};
use crate::descriptor::MySqlCommandNotifierConfigDto;
use crate::error::ConfigurationError;

pub const CONF_HOST: &str = "host";
pub const CONF_PORT: &str = "port";
pub const CONF_USERNAME: &str = "username";
pub const CONF_PASSWORD: &str = "password";
pub const CONF_DATABASE: &str = "database";
pub const CONF_TIMEOUT: &str = "timeout";
pub const CONF_BUFFERED: &str = "buffered";

pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BUFFERED: bool = false;

/// Validated connection parameters.
///
/// Built once when the notifier is created and shared read-only between
/// sends. Each send opens its own connection from these parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database hostname or IP address
    pub host: String,

    /// Database port (default: 3306)
    pub port: u16,

    /// Database user
    pub username: String,

    /// Database password
    pub password: String,

    /// Database selected on connect
    pub database: String,

    /// Connection establishment timeout in seconds (default: 10)
    pub timeout: u64,

    /// Fetch every result row client-side right after execution (default: false)
    pub buffered: bool,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("timeout", &self.timeout)
            .field("buffered", &self.buffered)
            .finish()
    }
}

impl ConnectionConfig {
    /// Create a builder for ConnectionConfig
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Load from a host configuration mapping, resolving `${VAR}` references
    /// from the process environment.
    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self, ConfigurationError> {
        Self::from_mapping_with_resolver(mapping, &EnvironmentVariableResolver)
    }

    /// Load from a host configuration mapping, resolving references with `resolver`.
    ///
    /// The mapping is deserialized as a [`MySqlCommandNotifierConfigDto`], so
    /// exactly the forms its published schema describes are accepted.
    /// Options are checked in table order and the first failure is returned.
    pub fn from_mapping_with_resolver(
        mapping: &Map<String, Value>,
        resolver: &dyn ValueResolver,
    ) -> Result<Self, ConfigurationError> {
        MySqlCommandNotifierConfigDto::from_mapping(mapping)?.resolve(resolver)
    }

    /// Load from a JSON value that must be an object.
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        match value {
            Value::Object(mapping) => Self::from_mapping(mapping),
            _ => Err(ConfigurationError::invalid_type(
                "config",
                "a mapping of options",
            )),
        }
    }

    /// Connection establishment timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, value) in [
            (CONF_HOST, &self.host),
            (CONF_USERNAME, &self.username),
            (CONF_PASSWORD, &self.password),
            (CONF_DATABASE, &self.database),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::empty(field));
            }
        }
        if self.port == 0 {
            return Err(ConfigurationError::invalid_value(
                CONF_PORT,
                "must be a positive integer",
            ));
        }
        if self.timeout == 0 {
            return Err(ConfigurationError::invalid_value(
                CONF_TIMEOUT,
                "must be a positive integer",
            ));
        }
        Ok(())
    }
}

/// Builder for [`ConnectionConfig`] when the options are already typed.
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    database: Option<String>,
    timeout: Option<u64>,
    buffered: Option<bool>,
}

impl ConnectionConfigBuilder {
    /// Set the database hostname
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the database port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database user
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the database password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the connection timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Some(timeout_secs);
        self
    }

    /// Enable or disable buffered cursors
    pub fn with_buffered(mut self, buffered: bool) -> Self {
        self.buffered = Some(buffered);
        self
    }

    /// Build and validate the ConnectionConfig
    pub fn build(self) -> Result<ConnectionConfig, ConfigurationError> {
        let config = ConnectionConfig {
            host: self.host.ok_or_else(|| ConfigurationError::missing(CONF_HOST))?,
            port: self.port.unwrap_or(DEFAULT_PORT),
            username: self
                .username
                .ok_or_else(|| ConfigurationError::missing(CONF_USERNAME))?,
            password: self
                .password
                .ok_or_else(|| ConfigurationError::missing(CONF_PASSWORD))?,
            database: self
                .database
                .ok_or_else(|| ConfigurationError::missing(CONF_DATABASE))?,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            buffered: self.buffered.unwrap_or(DEFAULT_BUFFERED),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_value::MapResolver;
    use crate::error::ConfigurationErrorReason;
    use serde_json::json;

    fn mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test mapping must be an object"),
        }
    }

    fn required() -> Value {
        json!({
            "platform": "mysql_command",
            "name": "mysql",
            "host": "db.local",
            "username": "homeassistant",
            "password": "secret",
            "database": "states"
        })
    }

    #[test]
    fn test_defaults_applied() {
        let config = ConnectionConfig::from_mapping(&mapping(required())).unwrap();
        assert_eq!(config.host, "db.local");
        assert_eq!(config.username, "homeassistant");
        assert_eq!(config.password, "secret");
        assert_eq!(config.database, "states");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert!(!config.buffered);
    }

    #[test]
    fn test_supplied_optionals_override_defaults() {
        let mut value = required();
        value["port"] = json!(3307);
        value["timeout"] = json!(5);
        value["buffered"] = json!(true);

        let config = ConnectionConfig::from_mapping(&mapping(value)).unwrap();
        assert_eq!(config.port, 3307);
        assert_eq!(config.timeout, 5);
        assert!(config.buffered);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let mut value = required();
        value["port"] = json!(" 3308 ");
        value["timeout"] = json!("30");
        value["buffered"] = json!("yes");

        let config = ConnectionConfig::from_mapping(&mapping(value)).unwrap();
        assert_eq!(config.port, 3308);
        assert_eq!(config.timeout, 30);
        assert!(config.buffered);
    }

    #[test]
    fn test_null_optional_uses_default() {
        let mut value = required();
        value["port"] = Value::Null;
        value["buffered"] = Value::Null;

        let config = ConnectionConfig::from_mapping(&mapping(value)).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.buffered);
    }

    #[test]
    fn test_missing_required_fields() {
        for field in [CONF_HOST, CONF_USERNAME, CONF_PASSWORD, CONF_DATABASE] {
            let mut map = mapping(required());
            map.remove(field);

            let err = ConnectionConfig::from_mapping(&map).unwrap_err();
            assert_eq!(err.field, field);
            assert_eq!(err.reason, ConfigurationErrorReason::Missing);
        }
    }

    #[test]
    fn test_empty_required_field() {
        let mut value = required();
        value["database"] = json!("  ");

        let err = ConnectionConfig::from_mapping(&mapping(value)).unwrap_err();
        assert_eq!(err.field, CONF_DATABASE);
        assert_eq!(err.reason, ConfigurationErrorReason::Empty);
    }

    #[test]
    fn test_non_numeric_port() {
        let mut value = required();
        value["port"] = json!("mysql");

        let err = ConnectionConfig::from_mapping(&mapping(value)).unwrap_err();
        assert_eq!(err.field, CONF_PORT);
    }

    #[test]
    fn test_port_out_of_range() {
        let mut value = required();
        value["port"] = json!(70000);

        let err = ConnectionConfig::from_mapping(&mapping(value)).unwrap_err();
        assert_eq!(err.field, CONF_PORT);
    }

    #[test]
    fn test_zero_and_negative_timeout_rejected() {
        for bad in [json!(0), json!(-5), json!("0")] {
            let mut value = required();
            value["timeout"] = bad;

            let err = ConnectionConfig::from_mapping(&mapping(value)).unwrap_err();
            assert_eq!(err.field, CONF_TIMEOUT);
        }
    }

    #[test]
    fn test_fractional_timeout_rejected() {
        let mut value = required();
        value["timeout"] = json!(2.5);

        let err = ConnectionConfig::from_mapping(&mapping(value)).unwrap_err();
        assert_eq!(err.field, CONF_TIMEOUT);
        assert_eq!(
            err.reason,
            ConfigurationErrorReason::InvalidType {
                expected: "an integer"
            }
        );
    }

    #[test]
    fn test_invalid_buffered() {
        let mut value = required();
        value["buffered"] = json!("sometimes");

        let err = ConnectionConfig::from_mapping(&mapping(value)).unwrap_err();
        assert_eq!(err.field, CONF_BUFFERED);
    }

    #[test]
    fn test_wrong_type_for_host() {
        let mut value = required();
        value["host"] = json!(["a", "b"]);

        let err = ConnectionConfig::from_mapping(&mapping(value)).unwrap_err();
        assert_eq!(err.field, CONF_HOST);
        assert_eq!(
            err.reason,
            ConfigurationErrorReason::InvalidType {
                expected: "a string"
            }
        );
    }

    #[test]
    fn test_first_failing_field_reported() {
        let value = json!({ "port": "x" });
        let err = ConnectionConfig::from_mapping(&mapping(value)).unwrap_err();
        assert_eq!(err.field, CONF_HOST);
    }

    #[test]
    fn test_references_resolved_before_coercion() {
        let mut value = required();
        value["password"] = json!("${MYSQL_PASSWORD}");
        value["port"] = json!("${MYSQL_PORT:-3310}");
        let resolver = MapResolver::new().with_value("MYSQL_PASSWORD", "from-env");

        let config = ConnectionConfig::from_mapping_with_resolver(&mapping(value), &resolver)
            .unwrap();
        assert_eq!(config.password, "from-env");
        assert_eq!(config.port, 3310);
    }

    #[test]
    fn test_structured_reference_and_unresolved_variable() {
        let mut value = required();
        value["username"] = json!({
            "kind": "EnvironmentVariable",
            "name": "MYSQL_USER",
            "default": "homeassistant"
        });
        let config =
            ConnectionConfig::from_mapping_with_resolver(&mapping(value.clone()), &MapResolver::new())
                .unwrap();
        assert_eq!(config.username, "homeassistant");

        value["timeout"] = json!("${MYSQL_TIMEOUT}");
        let err = ConnectionConfig::from_mapping_with_resolver(&mapping(value), &MapResolver::new())
            .unwrap_err();
        assert_eq!(err.field, CONF_TIMEOUT);
        assert_eq!(
            err.reason,
            ConfigurationErrorReason::UnresolvedReference {
                variable: "MYSQL_TIMEOUT".to_string()
            }
        );
    }

    #[test]
    fn test_from_value_requires_object() {
        let err = ConnectionConfig::from_value(&json!("host=db")).unwrap_err();
        assert_eq!(err.field, "config");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig::from_mapping(&mapping(required())).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_builder() {
        let config = ConnectionConfig::builder()
            .with_host("localhost")
            .with_username("root")
            .with_password("pw")
            .with_database("db")
            .with_buffered(true)
            .build()
            .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert!(config.buffered);

        let err = ConnectionConfig::builder()
            .with_host("localhost")
            .with_password("pw")
            .with_database("db")
            .build()
            .unwrap_err();
        assert_eq!(err.field, CONF_USERNAME);

        let err = ConnectionConfig::builder()
            .with_host("localhost")
            .with_username("root")
            .with_password("pw")
            .with_database("db")
            .with_port(0)
            .build()
            .unwrap_err();
        assert_eq!(err.field, CONF_PORT);
    }
}
