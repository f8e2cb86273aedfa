//! Configuration value returned by provider lookups

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ConfigError, ConfigResult};

/// Result of a [`Provider::get_value`](super::Provider::get_value) lookup
///
/// A value is either found (carrying data) or absent. Absence is not a failed
/// call: the caller decides whether a missing key is fatal, and asks for the
/// [`ConfigError::KeyNotFound`] through [`ConfigValue::value`] or
/// [`ConfigValue::error`] when it is.
///
/// The key is always the fully resolved key as seen by the provider that
/// answered, so a lookup through `scope("db")` for `"host"` reports `"db.host"`.
///
/// # Example
///
/// ```
/// use scopeconf_core::config::ConfigValue;
/// use serde_json::json;
///
/// let port = ConfigValue::found("db.port", "memory", json!(5432));
/// assert_eq!(port.as_i64().unwrap(), 5432);
///
/// let missing = ConfigValue::not_found("db.user", "memory");
/// assert_eq!(missing.as_string_or("postgres"), "postgres");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue {
    key: String,
    provider: String,
    value: Option<Value>,
}

impl ConfigValue {
    /// Create a value that was found
    pub fn found(key: impl Into<String>, provider: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            provider: provider.into(),
            value: Some(value),
        }
    }

    /// Create a value for a key the provider does not have
    pub fn not_found(key: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            provider: provider.into(),
            value: None,
        }
    }

    /// The resolved key this value was looked up under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name of the provider that answered the lookup
    pub fn provider_name(&self) -> &str {
        &self.provider
    }

    /// Whether the key was found
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Raw data, if found
    pub fn raw(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Consume the value and return the raw data, if found
    pub fn into_raw(self) -> Option<Value> {
        self.value
    }

    /// Raw data, or `KeyNotFound` carrying the resolved key
    pub fn value(&self) -> ConfigResult<&Value> {
        self.value
            .as_ref()
            .ok_or_else(|| ConfigError::key_not_found(&self.key))
    }

    /// The not-found condition for this lookup, if the key was absent
    pub fn error(&self) -> Option<ConfigError> {
        match self.value {
            Some(_) => None,
            None => Some(ConfigError::key_not_found(&self.key)),
        }
    }

    /// Read the value as a string slice
    pub fn as_str(&self) -> ConfigResult<&str> {
        self.value()?
            .as_str()
            .ok_or_else(|| ConfigError::type_mismatch(&self.key, "string"))
    }

    /// Read the value as a boolean
    ///
    /// The strings `"true"` and `"false"` are accepted, since environment
    /// sourced values are always strings.
    pub fn as_bool(&self) -> ConfigResult<bool> {
        match self.value()? {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ConfigError::type_mismatch(&self.key, "bool")),
            },
            _ => Err(ConfigError::type_mismatch(&self.key, "bool")),
        }
    }

    /// Read the value as a signed integer
    pub fn as_i64(&self) -> ConfigResult<i64> {
        let parsed = match self.value()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| ConfigError::type_mismatch(&self.key, "integer"))
    }

    /// Read the value as a float
    pub fn as_f64(&self) -> ConfigResult<f64> {
        let parsed = match self.value()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| ConfigError::type_mismatch(&self.key, "float"))
    }

    /// Deserialize the value (or a whole section) into `T`
    pub fn try_as<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        let value = self.value()?.clone();
        serde_json::from_value(value).map_err(|e| ConfigError::deserialize(&self.key, e))
    }

    /// String value, or `default` when absent or not a string
    pub fn as_string_or(&self, default: &str) -> String {
        self.as_str().unwrap_or(default).to_string()
    }

    /// Integer value, or `default` when absent or not an integer
    pub fn as_i64_or(&self, default: i64) -> i64 {
        self.as_i64().unwrap_or(default)
    }

    /// Boolean value, or `default` when absent or not a boolean
    pub fn as_bool_or(&self, default: bool) -> bool {
        self.as_bool().unwrap_or(default)
    }
}
