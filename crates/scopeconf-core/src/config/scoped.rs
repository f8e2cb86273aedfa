//! Prefix-scoped view over another provider

use std::sync::Arc;

use super::traits::Provider;
use super::value::ConfigValue;

/// A provider that rewrites keys under a namespace prefix
///
/// Lookups for `key` become lookups for `prefix.key` on the child. Scoping a
/// scoped provider wraps it again instead of replacing the prefix, so segments
/// appear in the final key in the order the `scope` calls were made:
///
/// ```
/// use std::sync::Arc;
/// use scopeconf_core::config::{MemoryProvider, Provider};
/// use serde_json::json;
///
/// let root = Arc::new(MemoryProvider::from_value(json!({"a": {"b": {"x": 1}}})));
/// let scoped = root.scope("a").scope("b");
/// assert_eq!(scoped.get_value("x").key(), "a.b.x");
/// assert_eq!(scoped.name(), "memory");
/// ```
///
/// Holds no mutable state and is safe to share across threads.
#[derive(Clone)]
pub struct ScopedProvider {
    prefix: String,
    child: Arc<dyn Provider>,
}

impl ScopedProvider {
    /// Wrap `child` so lookups resolve under `prefix`
    pub fn new(prefix: impl Into<String>, child: Arc<dyn Provider>) -> Self {
        Self {
            prefix: prefix.into(),
            child,
        }
    }

    /// The prefix applied by this layer only
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The provider this layer delegates to
    pub fn child(&self) -> &Arc<dyn Provider> {
        &self.child
    }
}

impl Provider for ScopedProvider {
    fn name(&self) -> &str {
        self.child.name()
    }

    fn get_value(&self, key: &str) -> ConfigValue {
        if self.prefix.is_empty() {
            return self.child.get_value(key);
        }
        self.child.get_value(&format!("{}.{}", self.prefix, key))
    }

    fn scope(self: Arc<Self>, prefix: &str) -> Arc<dyn Provider> {
        Arc::new(ScopedProvider::new(prefix, self))
    }
}

impl std::fmt::Debug for ScopedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedProvider")
            .field("prefix", &self.prefix)
            .field("child", &self.child.name())
            .finish()
    }
}
