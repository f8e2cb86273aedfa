//! Provider group with fallback behavior

use std::sync::Arc;

use super::scoped::ScopedProvider;
use super::traits::Provider;
use super::value::ConfigValue;

/// A named provider that chains several providers together
///
/// Lookups try each provider in order and return the first value found. When
/// no provider has the key the result is not-found, attributed to the group.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use scopeconf_core::config::{EnvProvider, MemoryProvider, Provider, ProviderGroup};
/// use serde_json::json;
///
/// let defaults: Arc<dyn Provider> =
///     Arc::new(MemoryProvider::from_value(json!({"db": {"port": 5432}})));
/// let env: Arc<dyn Provider> = Arc::new(EnvProvider::new("MYAPP"));
///
/// // Environment overrides defaults
/// let config = ProviderGroup::new("app", vec![env, defaults]);
/// assert_eq!(config.name(), "app");
/// assert_eq!(config.get_value("db.port").as_i64().unwrap(), 5432);
/// ```
pub struct ProviderGroup {
    name: String,
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderGroup {
    /// Create a group that tries `providers` in order
    pub fn new(name: impl Into<String>, providers: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            name: name.into(),
            providers,
        }
    }

    /// Append a lower-priority provider
    pub fn push(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// The providers in this group, highest priority first
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Find which provider answers a key
    pub fn find_provider(&self, key: &str) -> Option<&Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|provider| provider.get_value(key).has_value())
    }
}

impl Provider for ProviderGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_value(&self, key: &str) -> ConfigValue {
        self.providers
            .iter()
            .map(|provider| provider.get_value(key))
            .find(ConfigValue::has_value)
            .unwrap_or_else(|| ConfigValue::not_found(key, &self.name))
    }

    fn scope(self: Arc<Self>, prefix: &str) -> Arc<dyn Provider> {
        Arc::new(ScopedProvider::new(prefix, self))
    }
}

// Implement Debug manually since Arc<dyn Provider> doesn't implement Debug
impl std::fmt::Debug for ProviderGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ProviderGroup")
            .field("name", &self.name)
            .field("providers", &names)
            .finish()
    }
}
