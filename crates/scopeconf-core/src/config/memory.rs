//! In-memory configuration provider

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::registry::ChangeRegistry;
use super::scoped::ScopedProvider;
use super::traits::{ChangeCallback, ChangeToken, DynamicProvider, Provider};
use super::value::ConfigValue;
use crate::logging::{NoOpLogger, SharedLogger};

/// In-memory configuration provider
///
/// Values live in a `serde_json::Value` object tree. Dotted keys walk nested
/// objects, so `"db.host"` reads `{"db": {"host": ...}}` and `"db"` returns
/// the whole section.
///
/// [`set`](Self::set) and [`remove`](Self::remove) notify subscribers
/// registered for exactly that key.
///
/// # Example
///
/// ```
/// use scopeconf_core::config::{MemoryProvider, Provider};
/// use serde_json::json;
///
/// let config = MemoryProvider::from_value(json!({"applicationID": "svc1"}));
/// assert_eq!(config.get_value("applicationID").as_str().unwrap(), "svc1");
///
/// config.set("db.host", json!("localhost"));
/// assert_eq!(config.get_value("db").raw(), Some(&json!({"host": "localhost"})));
/// ```
pub struct MemoryProvider {
    name: String,
    root: RwLock<Value>,
    changes: ChangeRegistry,
    logger: SharedLogger,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    /// Create a new empty memory provider
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Create a memory provider over an initial value tree
    ///
    /// A non-object root is kept as-is and only answers the empty key.
    pub fn from_value(root: Value) -> Self {
        let logger: SharedLogger = Arc::new(NoOpLogger::new());
        Self {
            name: "memory".to_string(),
            root: RwLock::new(root),
            changes: ChangeRegistry::with_logger(Arc::clone(&logger)),
            logger,
        }
    }

    /// Report a different provider name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Log through `logger`, including change registry activity
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.changes = ChangeRegistry::with_logger(Arc::clone(&logger));
        self.logger = logger;
        self
    }

    /// Set a value, creating intermediate sections, and notify subscribers
    ///
    /// Returns the previous value at `key`, if any. A scalar sitting where a
    /// section is needed is replaced by an empty section. The empty key
    /// replaces the whole tree.
    ///
    /// Only subscribers of exactly `key` are notified. Overwriting a section
    /// such as `"db"` does not notify `"db.host"` subscribers, and replacing a
    /// scalar on the way to `key` does not notify that scalar's key.
    pub fn set(&self, key: &str, value: Value) -> Option<Value> {
        let previous = {
            let mut root = self.root.write();
            if key.is_empty() {
                Some(std::mem::replace(&mut *root, value.clone()))
            } else {
                insert_path(&mut root, key, value.clone())
            }
        };

        crate::log_debug!(self.logger, "{}: set {:?}", self.name, key);
        self.changes.notify(key, &self.name, &value);
        previous
    }

    /// Remove a value and notify subscribers with `null`
    ///
    /// Returns the removed value; nothing is delivered when the key was absent.
    /// The root can't be removed, so the empty key is a no-op. As with
    /// [`set`](Self::set), subscribers of keys under a removed section are not
    /// notified.
    pub fn remove(&self, key: &str) -> Option<Value> {
        if key.is_empty() {
            return None;
        }
        let removed = {
            let mut root = self.root.write();
            let (parent, last) = match key.rsplit_once('.') {
                Some((parent, last)) => (lookup_mut(&mut root, parent), last),
                None => (Some(&mut *root), key),
            };
            parent
                .and_then(|node| node.as_object_mut())
                .and_then(|map| map.remove(last))
        };

        if removed.is_some() {
            crate::log_debug!(self.logger, "{}: removed {:?}", self.name, key);
            self.changes.notify(key, &self.name, &Value::Null);
        }
        removed
    }

    /// Snapshot of the whole value tree
    pub fn snapshot(&self) -> Value {
        self.root.read().clone()
    }

    /// Number of live change subscriptions
    pub fn subscription_count(&self) -> usize {
        self.changes.len()
    }
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return Some(root);
    }
    key.split('.').try_fold(root, |node, segment| node.as_object()?.get(segment))
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

fn insert_path(root: &mut Value, key: &str, value: Value) -> Option<Value> {
    let mut segments = key.split('.');
    let last = segments.next_back().unwrap_or(key);
    let mut node = root;
    for segment in segments {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(last.to_string(), value)
}

fn lookup_mut<'a>(root: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    key.split('.')
        .try_fold(root, |node, segment| node.as_object_mut()?.get_mut(segment))
}

impl Provider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_value(&self, key: &str) -> ConfigValue {
        let root = self.root.read();
        match lookup(&root, key) {
            Some(value) => ConfigValue::found(key, &self.name, value.clone()),
            None => ConfigValue::not_found(key, &self.name),
        }
    }

    fn scope(self: Arc<Self>, prefix: &str) -> Arc<dyn Provider> {
        Arc::new(ScopedProvider::new(prefix, self))
    }
}

impl DynamicProvider for MemoryProvider {
    fn register_change_callback(&self, key: &str, callback: ChangeCallback) -> Option<ChangeToken> {
        self.changes.register(key, callback)
    }

    fn unregister_change_callback(&self, token: ChangeToken) -> bool {
        self.changes.unregister(token)
    }

    fn shutdown(&self) {
        self.changes.shutdown();
    }
}

impl std::fmt::Debug for MemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryProvider")
            .field("name", &self.name)
            .field("changes", &self.changes)
            .finish()
    }
}
