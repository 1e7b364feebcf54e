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

//! Configuration values that are either given inline or referenced from the
//! environment.
//!
//! [`ConfigValue<T>`] is the field type of the notifier's configuration DTO.
//! Each option accepts three forms:
//!
//! ```yaml
//! host: db.local                 # static value
//! password: "${MYSQL_PASSWORD}"  # POSIX reference
//! port: "${MYSQL_PORT:-3306}"    # POSIX reference with default
//! username:                      # structured reference
//!   kind: EnvironmentVariable
//!   name: MYSQL_USER
//!   default: homeassistant
//! ```
//!
//! Static values are coerced through [`ConfigScalar`], so `port: "3306"` and
//! `buffered: "yes"` are accepted as well. A resolved reference is always a
//! string and goes through the same string coercion.
//!
//! The `ConfigValue*Schema` types publish exactly these forms as OpenAPI
//! schemas, for use as `#[schema(value_type = ...)]` on DTO fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use utoipa::openapi::schema::{AnyOfBuilder, ObjectBuilder, Schema, Type};
use utoipa::openapi::RefOr;

use crate::error::ConfigurationErrorReason;

const ENVIRONMENT_VARIABLE_KIND: &str = "EnvironmentVariable";

/// An option type the notifier knows how to coerce from JSON.
pub trait ConfigScalar: Sized + Clone + Serialize {
    /// Coerce a static JSON value.
    fn from_json(value: &Value) -> Result<Self, ConfigurationErrorReason>;

    /// Coerce the text of a resolved environment reference.
    fn from_text(text: &str) -> Result<Self, ConfigurationErrorReason> {
        Self::from_json(&Value::String(text.to_string()))
    }
}

impl ConfigScalar for String {
    fn from_json(value: &Value) -> Result<Self, ConfigurationErrorReason> {
        match value {
            Value::String(s) => Ok(s.clone()),
            // Numeric passwords and host aliases
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(ConfigurationErrorReason::InvalidType {
                expected: "a string",
            }),
        }
    }
}

impl ConfigScalar for u64 {
    fn from_json(value: &Value) -> Result<Self, ConfigurationErrorReason> {
        let parsed: i128 = match value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    u as i128
                } else if let Some(i) = n.as_i64() {
                    i as i128
                } else {
                    return Err(ConfigurationErrorReason::InvalidType {
                        expected: "an integer",
                    });
                }
            }
            Value::String(s) => s.trim().parse::<i128>().map_err(|_| {
                ConfigurationErrorReason::InvalidValue(format!("'{s}' is not an integer"))
            })?,
            _ => {
                return Err(ConfigurationErrorReason::InvalidType {
                    expected: "an integer",
                })
            }
        };

        if parsed <= 0 {
            return Err(ConfigurationErrorReason::InvalidValue(format!(
                "must be a positive integer, got {parsed}"
            )));
        }
        u64::try_from(parsed).map_err(|_| {
            ConfigurationErrorReason::InvalidValue(format!("{parsed} is out of range"))
        })
    }
}

impl ConfigScalar for u16 {
    fn from_json(value: &Value) -> Result<Self, ConfigurationErrorReason> {
        let n = u64::from_json(value)?;
        u16::try_from(n).map_err(|_| {
            ConfigurationErrorReason::InvalidValue(format!("{n} is not a valid port number"))
        })
    }
}

impl ConfigScalar for bool {
    fn from_json(value: &Value) -> Result<Self, ConfigurationErrorReason> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(ConfigurationErrorReason::InvalidValue(format!(
                    "{n} is not a boolean"
                ))),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" | "enable" => Ok(true),
                "0" | "false" | "no" | "off" | "disable" => Ok(false),
                _ => Err(ConfigurationErrorReason::InvalidValue(format!(
                    "'{s}' is not a boolean"
                ))),
            },
            _ => Err(ConfigurationErrorReason::InvalidType {
                expected: "a boolean",
            }),
        }
    }
}

/// A configuration value given inline or referenced from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue<T> {
    /// A reference to an environment variable, with an optional fallback.
    EnvironmentVariable {
        name: String,
        default: Option<String>,
    },

    /// A value given directly in the configuration.
    Static(T),
}

pub type ConfigValueString = ConfigValue<String>;
pub type ConfigValueU16 = ConfigValue<u16>;
pub type ConfigValueU64 = ConfigValue<u64>;
pub type ConfigValueBool = ConfigValue<bool>;

impl<T: ConfigScalar> ConfigValue<T> {
    /// Recognise a reference or coerce a static value.
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationErrorReason> {
        if let Value::Object(map) = value {
            if map.get("kind").and_then(Value::as_str) == Some(ENVIRONMENT_VARIABLE_KIND) {
                let name = map.get("name").and_then(Value::as_str).ok_or_else(|| {
                    ConfigurationErrorReason::InvalidValue(
                        "environment reference needs a 'name'".to_string(),
                    )
                })?;
                let default = map
                    .get("default")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                return Ok(Self::EnvironmentVariable {
                    name: name.to_string(),
                    default,
                });
            }
        }

        if let Value::String(s) = value {
            if let Some(reference) = parse_posix_env_var(s) {
                return Ok(reference);
            }
        }

        T::from_json(value).map(Self::Static)
    }

    /// Produce the final value, looking references up with `resolver`.
    pub fn resolve(&self, resolver: &dyn ValueResolver) -> Result<T, ConfigurationErrorReason> {
        match self {
            Self::Static(value) => Ok(value.clone()),
            Self::EnvironmentVariable { name, default } => {
                let text = resolver.lookup(name).or_else(|| default.clone()).ok_or_else(|| {
                    ConfigurationErrorReason::UnresolvedReference {
                        variable: name.clone(),
                    }
                })?;
                T::from_text(&text)
            }
        }
    }
}

/// Parse `${VAR}` or `${VAR:-default}`.
fn parse_posix_env_var<T>(s: &str) -> Option<ConfigValue<T>> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    if inner.is_empty() {
        return None;
    }

    match inner.split_once(":-") {
        Some((name, default)) => Some(ConfigValue::EnvironmentVariable {
            name: name.to_string(),
            default: Some(default.to_string()),
        }),
        None => Some(ConfigValue::EnvironmentVariable {
            name: inner.to_string(),
            default: None,
        }),
    }
}

impl<T: Serialize> Serialize for ConfigValue<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        match self {
            ConfigValue::EnvironmentVariable { name, default } => {
                let size = if default.is_some() { 3 } else { 2 };
                let mut map = serializer.serialize_map(Some(size))?;
                map.serialize_entry("kind", ENVIRONMENT_VARIABLE_KIND)?;
                map.serialize_entry("name", name)?;
                if let Some(d) = default {
                    map.serialize_entry("default", d)?;
                }
                map.end()
            }
            ConfigValue::Static(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: ConfigScalar> Deserialize<'de> for ConfigValue<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(D::Error::custom)
    }
}

/// Looks up the value behind an environment reference.
pub trait ValueResolver: Send + Sync {
    /// Returns `None` when the referenced variable is not set.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads references from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentVariableResolver;

impl ValueResolver for EnvironmentVariableResolver {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Resolves references from a fixed map. Used when the host hands over its
/// own variable set instead of the process environment.
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    values: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl ValueResolver for MapResolver {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

fn string_schema(description: &str) -> Schema {
    Schema::Object(
        ObjectBuilder::new()
            .schema_type(Type::String)
            .description(Some(description))
            .build(),
    )
}

fn patterned_string_schema(pattern: &str, description: &str) -> Schema {
    Schema::Object(
        ObjectBuilder::new()
            .schema_type(Type::String)
            .pattern(Some(pattern))
            .description(Some(description))
            .build(),
    )
}

fn environment_reference_schema() -> Schema {
    Schema::Object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .property(
                "kind",
                RefOr::T(Schema::Object(
                    ObjectBuilder::new()
                        .schema_type(Type::String)
                        .enum_values(Some([ENVIRONMENT_VARIABLE_KIND]))
                        .build(),
                )),
            )
            .required("kind")
            .property("name", RefOr::T(string_schema("Variable name")))
            .required("name")
            .property(
                "default",
                RefOr::T(string_schema("Used when the variable is not set")),
            )
            .description(Some("Structured environment variable reference"))
            .build(),
    )
}

/// Any of `static_forms`, a POSIX reference, or a structured reference.
fn config_value_schema(description: &str, static_forms: Vec<Schema>) -> RefOr<Schema> {
    let mut any_of = AnyOfBuilder::new().description(Some(description));
    for form in static_forms {
        any_of = any_of.item(RefOr::T(form));
    }
    any_of = any_of
        .item(RefOr::T(patterned_string_schema(
            r"^\$\{[^}]+\}$",
            "POSIX environment reference: ${VAR} or ${VAR:-default}",
        )))
        .item(RefOr::T(environment_reference_schema()));
    RefOr::T(Schema::AnyOf(any_of.build()))
}

/// OpenAPI schema for [`ConfigValueString`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigValueStringSchema;

impl utoipa::PartialSchema for ConfigValueStringSchema {
    fn schema() -> RefOr<Schema> {
        config_value_schema(
            "A string, or a number used as its text",
            vec![
                string_schema("Static string"),
                Schema::Object(ObjectBuilder::new().schema_type(Type::Number).build()),
            ],
        )
    }
}

impl utoipa::ToSchema for ConfigValueStringSchema {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("ConfigValueString")
    }
}

/// OpenAPI schema for [`ConfigValueU16`] and [`ConfigValueU64`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigValueIntegerSchema;

impl utoipa::PartialSchema for ConfigValueIntegerSchema {
    fn schema() -> RefOr<Schema> {
        config_value_schema(
            "A positive integer, or its decimal text",
            vec![
                Schema::Object(ObjectBuilder::new().schema_type(Type::Integer).build()),
                patterned_string_schema(r"^\s*[0-9]+\s*$", "Integer as text"),
            ],
        )
    }
}

impl utoipa::ToSchema for ConfigValueIntegerSchema {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("ConfigValueInteger")
    }
}

/// OpenAPI schema for [`ConfigValueBool`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigValueBoolSchema;

impl utoipa::PartialSchema for ConfigValueBoolSchema {
    fn schema() -> RefOr<Schema> {
        config_value_schema(
            "A boolean, 0 or 1, or one of true/false, yes/no, on/off, enable/disable",
            vec![
                Schema::Object(ObjectBuilder::new().schema_type(Type::Boolean).build()),
                Schema::Object(
                    ObjectBuilder::new()
                        .schema_type(Type::Integer)
                        .enum_values(Some([0, 1]))
                        .build(),
                ),
                patterned_string_schema(
                    r"^\s*(?i:1|0|true|false|yes|no|on|off|enable|disable)\s*$",
                    "Boolean as text",
                ),
            ],
        )
    }
}

impl utoipa::ToSchema for ConfigValueBoolSchema {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("ConfigValueBool")
    }
}
