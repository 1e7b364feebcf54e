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

//! Descriptor for the mysql_command notifier plugin.
//!
//! A host platform discovers notifiers through [`NotifierPluginDescriptor`]:
//! it matches the `platform` key of a notifier entry against
//! [`kind()`](NotifierPluginDescriptor::kind), publishes the schema returned
//! by [`config_schema_json()`](NotifierPluginDescriptor::config_schema_json),
//! and calls [`create_notifier()`](NotifierPluginDescriptor::create_notifier)
//! once per configured entry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::OpenApi;

use crate::config::{
    ConnectionConfig, CONF_BUFFERED, CONF_DATABASE, CONF_HOST, CONF_PASSWORD, CONF_PORT,
    CONF_TIMEOUT, CONF_USERNAME,
};
use crate::config_value::{
    ConfigScalar, ConfigValue, ConfigValueBool, ConfigValueBoolSchema, ConfigValueIntegerSchema,
    ConfigValueString, ConfigValueStringSchema, ConfigValueU16, ConfigValueU64, ValueResolver,
};
use crate::error::{ConfigurationError, ConfigurationErrorReason, NotifyError};
use crate::service::{MySqlCommandNotificationService, NotificationService};

/// Descriptor for a **notifier** plugin.
#[async_trait]
pub trait NotifierPluginDescriptor: Send + Sync {
    /// The platform name used in host configuration (e.g. `"mysql_command"`).
    fn kind(&self) -> &str;

    /// The semver version of this plugin's configuration DTO.
    fn config_version(&self) -> &str;

    /// OpenAPI schema name of the configuration DTO.
    fn config_schema_name(&self) -> &str;

    /// All OpenAPI schemas for this plugin as a JSON-serialized map.
    fn config_schema_json(&self) -> String;

    /// Create a notifier from its raw configuration.
    ///
    /// Configuration errors are returned before any connection is attempted.
    async fn create_notifier(
        &self,
        id: &str,
        config_json: &Value,
    ) -> Result<Box<dyn NotificationService>, NotifyError>;
}

/// Configuration DTO for the mysql_command notifier plugin.
///
/// This is the only shape the loader reads: [`ConnectionConfig::from_mapping`]
/// deserializes it and then calls [`resolve`](Self::resolve). Integer and
/// boolean options also accept their string forms, and every option accepts
/// a `${VAR}`, `${VAR:-default}` or `{kind: EnvironmentVariable}` reference.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(as = notifier::mysql_command::MySqlCommandNotifierConfig)]
pub struct MySqlCommandNotifierConfigDto {
    /// Database hostname or IP address.
    #[schema(value_type = ConfigValueStringSchema)]
    pub host: ConfigValueString,

    /// Database port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<ConfigValueIntegerSchema>, default = 3306)]
    pub port: Option<ConfigValueU16>,

    /// Database user.
    #[schema(value_type = ConfigValueStringSchema)]
    pub username: ConfigValueString,

    /// Database password.
    #[schema(value_type = ConfigValueStringSchema)]
    pub password: ConfigValueString,

    /// Database selected on connect.
    #[schema(value_type = ConfigValueStringSchema)]
    pub database: ConfigValueString,

    /// Connection timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<ConfigValueIntegerSchema>, default = 10)]
    pub timeout: Option<ConfigValueU64>,

    /// Fetch every result row before returning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<ConfigValueBoolSchema>, default = false)]
    pub buffered: Option<ConfigValueBool>,
}

impl MySqlCommandNotifierConfigDto {
    /// Deserialize a host configuration mapping.
    ///
    /// On failure the first offending option, in table order, is named.
    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self, ConfigurationError> {
        serde_json::from_value(Value::Object(mapping.clone())).map_err(|e| {
            first_invalid_field(mapping)
                .unwrap_or_else(|| ConfigurationError::invalid_value("config", e.to_string()))
        })
    }

    /// Resolve environment references, apply defaults and validate.
    pub fn resolve(
        &self,
        resolver: &dyn ValueResolver,
    ) -> Result<ConnectionConfig, ConfigurationError> {
        let mut builder = ConnectionConfig::builder()
            .with_host(self.host.resolve(resolver).map_err(in_field(CONF_HOST))?);
        if let Some(ref v) = self.port {
            builder = builder.with_port(v.resolve(resolver).map_err(in_field(CONF_PORT))?);
        }
        builder = builder
            .with_username(self.username.resolve(resolver).map_err(in_field(CONF_USERNAME))?)
            .with_password(self.password.resolve(resolver).map_err(in_field(CONF_PASSWORD))?)
            .with_database(self.database.resolve(resolver).map_err(in_field(CONF_DATABASE))?);
        if let Some(ref v) = self.timeout {
            builder = builder.with_timeout(v.resolve(resolver).map_err(in_field(CONF_TIMEOUT))?);
        }
        if let Some(ref v) = self.buffered {
            builder =
                builder.with_buffered(v.resolve(resolver).map_err(in_field(CONF_BUFFERED))?);
        }
        builder.build()
    }
}

fn in_field(field: &'static str) -> impl Fn(ConfigurationErrorReason) -> ConfigurationError {
    move |reason| ConfigurationError::new(field, reason)
}

fn check_field<T: ConfigScalar>(
    mapping: &Map<String, Value>,
    field: &'static str,
    required: bool,
) -> Option<ConfigurationError> {
    match mapping.get(field) {
        None | Some(Value::Null) if required => Some(ConfigurationError::missing(field)),
        None | Some(Value::Null) => None,
        Some(value) => ConfigValue::<T>::from_json(value).err().map(in_field(field)),
    }
}

fn first_invalid_field(mapping: &Map<String, Value>) -> Option<ConfigurationError> {
    check_field::<String>(mapping, CONF_HOST, true)
        .or_else(|| check_field::<u16>(mapping, CONF_PORT, false))
        .or_else(|| check_field::<String>(mapping, CONF_USERNAME, true))
        .or_else(|| check_field::<String>(mapping, CONF_PASSWORD, true))
        .or_else(|| check_field::<String>(mapping, CONF_DATABASE, true))
        .or_else(|| check_field::<u64>(mapping, CONF_TIMEOUT, false))
        .or_else(|| check_field::<bool>(mapping, CONF_BUFFERED, false))
}

#[derive(OpenApi)]
#[openapi(components(schemas(
    MySqlCommandNotifierConfigDto,
    ConfigValueStringSchema,
    ConfigValueIntegerSchema,
    ConfigValueBoolSchema,
)))]
struct MySqlCommandNotifierSchemas;

/// Build the service for one configured notifier entry.
pub fn get_service(
    id: &str,
    config_json: &Value,
) -> Result<MySqlCommandNotificationService, NotifyError> {
    let config = ConnectionConfig::from_value(config_json)?;
    MySqlCommandNotificationService::new(id, config)
}

/// Descriptor for the mysql_command notifier plugin.
pub struct MySqlCommandNotifierDescriptor;

#[async_trait]
impl NotifierPluginDescriptor for MySqlCommandNotifierDescriptor {
    fn kind(&self) -> &str {
        "mysql_command"
    }

    fn config_version(&self) -> &str {
        "1.0.0"
    }

    fn config_schema_name(&self) -> &str {
        "notifier.mysql_command.MySqlCommandNotifierConfig"
    }

    fn config_schema_json(&self) -> String {
        let api = MySqlCommandNotifierSchemas::openapi();
        api.components
            .as_ref()
            .and_then(|components| serde_json::to_string(&components.schemas).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    async fn create_notifier(
        &self,
        id: &str,
        config_json: &Value,
    ) -> Result<Box<dyn NotificationService>, NotifyError> {
        let service = get_service(id, config_json)?;
        Ok(Box::new(service))
    }
}
