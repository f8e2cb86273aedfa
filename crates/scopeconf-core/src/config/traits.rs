//! Configuration provider traits

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::value::ConfigValue;

/// Configuration provider abstraction
///
/// Implementations:
/// - `MemoryProvider`: In-memory value tree, supports change callbacks
/// - `EnvProvider`: Reads from process environment variables
/// - `ProviderGroup`: Tries several providers in order
/// - `ScopedProvider`: Re-roots another provider under a key prefix
///
/// Any type implementing this trait is a valid provider; callers usually hold
/// providers as `Arc<dyn Provider>`.
pub trait Provider: Send + Sync {
    /// Name of the concrete source (e.g. "memory", "env")
    ///
    /// Scoping never changes the name.
    fn name(&self) -> &str;

    /// Look up a key in this provider's namespace
    ///
    /// This is a pure read. An absent key is reported through the returned
    /// [`ConfigValue`], never by failing the call.
    fn get_value(&self, key: &str) -> ConfigValue;

    /// Return a view of this provider rooted at `prefix`
    ///
    /// Lookups on the returned provider resolve under `prefix + "." + key`.
    /// An empty prefix is an identity view. The receiver is not modified.
    fn scope(self: Arc<Self>, prefix: &str) -> Arc<dyn Provider>;
}

/// Callback invoked with `(key, provider_name, new_value)` when a key changes
pub type ChangeCallback = Arc<dyn Fn(&str, &str, &Value) + Send + Sync>;

/// Opaque identifier of a change subscription
///
/// Tokens are unique for the lifetime of the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeToken(u64);

impl ChangeToken {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric id of this token
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "change-{}", self.0)
    }
}

/// A provider that can notify subscribers of live value changes
///
/// A dynamic provider is either active or shut down. Shutdown is terminal:
/// all registrations are dropped and no callback starts afterwards.
pub trait DynamicProvider: Provider {
    /// Subscribe `callback` to changes of `key`
    ///
    /// Returns `None` once the provider has been shut down; no subscription is
    /// created in that case.
    fn register_change_callback(&self, key: &str, callback: ChangeCallback) -> Option<ChangeToken>;

    /// Cancel a subscription
    ///
    /// Returns whether a subscription was removed. Unknown or already removed
    /// tokens return `false`.
    fn unregister_change_callback(&self, token: ChangeToken) -> bool;

    /// Drop all subscriptions and stop delivering changes. Idempotent.
    fn shutdown(&self);
}

/// Shared provider handle
pub type SharedProvider = Arc<dyn Provider>;
