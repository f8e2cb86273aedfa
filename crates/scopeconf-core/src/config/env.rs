//! Environment variable configuration provider

use std::env;
use std::sync::Arc;

use serde_json::Value;

use super::scoped::ScopedProvider;
use super::traits::Provider;
use super::value::ConfigValue;

/// Configuration provider that reads process environment variables
///
/// Dotted keys map to upper-case variable names: with prefix `"APP"` the key
/// `"db.host"` reads `APP_DB_HOST`. Dashes become underscores. Values are
/// always strings; the typed accessors on [`ConfigValue`] parse them.
///
/// This provider is read-only and reads the live environment on every lookup.
/// Empty variables count as absent.
///
/// # Example
///
/// ```
/// use scopeconf_core::config::{EnvProvider, Provider};
///
/// let env = EnvProvider::new("APP");
/// assert_eq!(env.var_name("db.max-conns"), "APP_DB_MAX_CONNS");
/// ```
#[derive(Debug, Clone)]
pub struct EnvProvider {
    name: String,
    prefix: String,
    separator: String,
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::new("")
    }
}

impl EnvProvider {
    /// Create a provider reading variables under `prefix` (may be empty)
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            name: "env".to_string(),
            prefix: prefix.into(),
            separator: "_".to_string(),
        }
    }

    /// Use a different separator between key segments
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Report a different provider name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Variable prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Environment variable name a key resolves to
    pub fn var_name(&self, key: &str) -> String {
        let body = key
            .split('.')
            .map(|segment| segment.replace('-', "_"))
            .collect::<Vec<_>>()
            .join(&self.separator);

        let name = if self.prefix.is_empty() {
            body
        } else if body.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}{}{}", self.prefix, self.separator, body)
        };
        name.to_uppercase()
    }
}

impl Provider for EnvProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_value(&self, key: &str) -> ConfigValue {
        match env::var(self.var_name(key)) {
            Ok(value) if !value.is_empty() => ConfigValue::found(key, &self.name, Value::String(value)),
            _ => ConfigValue::not_found(key, &self.name),
        }
    }

    fn scope(self: Arc<Self>, prefix: &str) -> Arc<dyn Provider> {
        Arc::new(ScopedProvider::new(prefix, self))
    }
}
