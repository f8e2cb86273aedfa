//! Change callback registry shared by dynamic providers
//!
//! Dynamic providers embed a [`ChangeRegistry`] and forward the
//! [`DynamicProvider`](super::DynamicProvider) methods to it. When the backing
//! source observes a change, the provider calls [`ChangeRegistry::notify`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::traits::{ChangeCallback, ChangeToken};
use crate::logging::{NoOpLogger, SharedLogger};

struct Subscription {
    key: String,
    callback: ChangeCallback,
}

thread_local! {
    // Registries this thread is currently running a callback for
    static DELIVERING: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

/// Marks the current thread as inside a callback of one registry
struct DeliveryMark(usize);

impl DeliveryMark {
    fn enter(registry: &ChangeRegistry) -> Self {
        let id = registry.id();
        DELIVERING.with(|ids| ids.borrow_mut().push(id));
        Self(id)
    }

    fn is_active(registry: &ChangeRegistry) -> bool {
        let id = registry.id();
        DELIVERING.with(|ids| ids.borrow().contains(&id))
    }
}

impl Drop for DeliveryMark {
    fn drop(&mut self) {
        DELIVERING.with(|ids| {
            let mut ids = ids.borrow_mut();
            if let Some(pos) = ids.iter().rposition(|id| *id == self.0) {
                ids.remove(pos);
            }
        });
    }
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    subscriptions: HashMap<ChangeToken, Subscription>,
    shut_down: bool,
}

/// Token-keyed registry of change callbacks
///
/// # Thread Safety
///
/// All mutation happens under one mutex. The mutex is never held while a
/// callback runs, so callbacks may register or unregister subscriptions on the
/// same registry.
///
/// Each invocation also holds a shared delivery gate. [`shutdown`](Self::shutdown)
/// takes the gate exclusively before returning, so it waits for callbacks
/// running on other threads. A callback that shuts down its own registry does
/// not wait for itself. Callbacks must not block on a thread that is shutting
/// down the same registry.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use scopeconf_core::config::ChangeRegistry;
/// use serde_json::json;
///
/// let registry = ChangeRegistry::new();
/// let token = registry
///     .register("db.host", Arc::new(|key: &str, provider: &str, value: &serde_json::Value| {
///         println!("{provider}: {key} -> {value}");
///     }))
///     .unwrap();
///
/// assert_eq!(registry.notify("db.host", "memory", &json!("10.0.0.1")), 1);
/// assert!(registry.unregister(token));
/// ```
pub struct ChangeRegistry {
    state: Mutex<RegistryState>,
    delivery: RwLock<()>,
    logger: SharedLogger,
}

impl Default for ChangeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeRegistry {
    /// Create an empty, active registry
    pub fn new() -> Self {
        Self::with_logger(Arc::new(NoOpLogger::new()))
    }

    /// Create an empty registry that logs through `logger`
    pub fn with_logger(logger: SharedLogger) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            delivery: RwLock::new(()),
            logger,
        }
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// Subscribe `callback` to changes of `key`
    ///
    /// Returns `None` after [`shutdown`](Self::shutdown).
    pub fn register(&self, key: &str, callback: ChangeCallback) -> Option<ChangeToken> {
        let mut state = self.state.lock();
        if state.shut_down {
            drop(state);
            crate::log_warn!(self.logger, "ignoring change callback for {:?}: registry is shut down", key);
            return None;
        }

        state.next_id += 1;
        let token = ChangeToken::new(state.next_id);
        state.subscriptions.insert(
            token,
            Subscription {
                key: key.to_string(),
                callback,
            },
        );
        drop(state);

        crate::log_debug!(self.logger, "registered {} for {:?}", token, key);
        Some(token)
    }

    /// Remove a subscription, returning whether it existed
    pub fn unregister(&self, token: ChangeToken) -> bool {
        let removed = self.state.lock().subscriptions.remove(&token).is_some();
        if removed {
            crate::log_debug!(self.logger, "unregistered {}", token);
        }
        removed
    }

    /// Drop every subscription and refuse new ones. Idempotent.
    ///
    /// Waits for callbacks already running on other threads, so no callback
    /// is running or starts after this returns. Called from inside one of
    /// this registry's callbacks it only stops further deliveries.
    pub fn shutdown(&self) {
        let dropped = {
            let mut state = self.state.lock();
            let first = !state.shut_down;
            state.shut_down = true;
            first.then(|| std::mem::take(&mut state.subscriptions))
        };

        if !DeliveryMark::is_active(self) {
            drop(self.delivery.write());
        }

        // Callbacks are dropped outside the lock; their destructors may re-enter.
        if let Some(dropped) = dropped {
            let count = dropped.len();
            drop(dropped);
            crate::log_debug!(self.logger, "shut down change registry, dropped {} subscription(s)", count);
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shut_down
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Whether there are no live subscriptions
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a change of `key` to every matching subscription
    ///
    /// Matching callbacks are snapshotted, then each is re-checked under the
    /// lock right before it runs: a subscription removed (or a registry shut
    /// down) by an earlier callback in the same delivery is skipped.
    /// Subscriptions added during delivery only see later changes.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, key: &str, provider: &str, value: &Value) -> usize {
        let mut matching: Vec<ChangeToken> = {
            let state = self.state.lock();
            if state.shut_down {
                return 0;
            }
            state
                .subscriptions
                .iter()
                .filter(|(_, sub)| sub.key == key)
                .map(|(token, _)| *token)
                .collect()
        };
        // Registration order
        matching.sort();

        let mut delivered = 0;
        for token in matching {
            // Recursive read: a nested delivery must not queue behind a waiting shutdown
            let _gate = self.delivery.read_recursive();
            let callback = {
                let state = self.state.lock();
                match state.subscriptions.get(&token) {
                    Some(sub) if !state.shut_down => Arc::clone(&sub.callback),
                    _ => continue,
                }
            };
            let _mark = DeliveryMark::enter(self);
            callback(key, provider, value);
            delivered += 1;
        }

        crate::log_debug!(self.logger, "delivered change of {:?} from {} to {} callback(s)", key, provider, delivered);
        delivered
    }
}

impl std::fmt::Debug for ChangeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ChangeRegistry")
            .field("subscriptions", &state.subscriptions.len())
            .field("shut_down", &state.shut_down)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, ChangeCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let callback: ChangeCallback = Arc::new(move |_: &str, _: &str, _: &Value| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_tokens_are_unique() {
        let registry = ChangeRegistry::new();
        let (_, cb) = counter();

        let t1 = registry.register("a", cb.clone()).unwrap();
        let t2 = registry.register("a", cb.clone()).unwrap();
        assert!(registry.unregister(t1));
        let t3 = registry.register("a", cb).unwrap();

        assert_ne!(t1, t2);
        assert_ne!(t1, t3);
        assert_ne!(t2, t3);
    }

    #[test]
    fn test_two_callbacks_same_key_each_fire_once() {
        let registry = ChangeRegistry::new();
        let (first, cb1) = counter();
        let (second, cb2) = counter();

        registry.register("db.host", cb1).unwrap();
        registry.register("db.host", cb2).unwrap();

        assert_eq!(registry.notify("db.host", "memory", &json!("h")), 2);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_only_matching_key_fires() {
        let registry = ChangeRegistry::new();
        let (count, cb) = counter();
        registry.register("db.host", cb).unwrap();

        assert_eq!(registry.notify("db.port", "memory", &json!(1)), 0);
        assert_eq!(registry.notify("db", "memory", &json!({})), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_receives_arguments() {
        let registry = ChangeRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry
            .register(
                "applicationID",
                Arc::new(move |key: &str, provider: &str, value: &Value| {
                    sink.lock().push((key.to_string(), provider.to_string(), value.clone()));
                }),
            )
            .unwrap();

        registry.notify("applicationID", "memory", &json!("svc2"));
        assert_eq!(
            *seen.lock(),
            vec![("applicationID".to_string(), "memory".to_string(), json!("svc2"))]
        );
    }

    #[test]
    fn test_unregister_twice() {
        let registry = ChangeRegistry::new();
        let (count, cb) = counter();
        let token = registry.register("k", cb).unwrap();

        assert!(registry.unregister(token));
        assert!(!registry.unregister(token));
        assert_eq!(registry.notify("k", "memory", &json!(1)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_is_terminal() {
        let registry = ChangeRegistry::new();
        let (count, cb) = counter();
        let before = registry.register("k", cb.clone()).unwrap();

        registry.shutdown();
        assert!(registry.is_shut_down());
        assert!(registry.is_empty());

        assert!(registry.register("k", cb).is_none());
        assert!(!registry.unregister(before));
        assert_eq!(registry.notify("k", "memory", &json!(1)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Second shutdown is a no-op
        registry.shutdown();
        assert!(registry.is_shut_down());
    }

    #[test]
    fn test_callback_can_unregister_itself() {
        let registry = Arc::new(ChangeRegistry::new());
        let token_slot: Arc<Mutex<Option<ChangeToken>>> = Arc::new(Mutex::new(None));
        let fired = Arc::new(AtomicUsize::new(0));

        let reg = Arc::clone(&registry);
        let slot = Arc::clone(&token_slot);
        let f = Arc::clone(&fired);
        let token = registry
            .register(
                "k",
                Arc::new(move |_: &str, _: &str, _: &Value| {
                    f.fetch_add(1, Ordering::SeqCst);
                    if let Some(token) = *slot.lock() {
                        assert!(reg.unregister(token));
                    }
                }),
            )
            .unwrap();
        *token_slot.lock() = Some(token);

        assert_eq!(registry.notify("k", "memory", &json!(1)), 1);
        assert_eq!(registry.notify("k", "memory", &json!(2)), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_can_register_during_delivery() {
        let registry = Arc::new(ChangeRegistry::new());
        let (late_count, late_cb) = counter();

        let reg = Arc::clone(&registry);
        registry
            .register(
                "k",
                Arc::new(move |_: &str, _: &str, _: &Value| {
                    reg.register("k", late_cb.clone()).unwrap();
                }),
            )
            .unwrap();

        // The subscription added mid-delivery does not see the current change
        assert_eq!(registry.notify("k", "memory", &json!(1)), 1);
        assert_eq!(late_count.load(Ordering::SeqCst), 0);

        // It sees the next one
        registry.notify("k", "memory", &json!(2));
        assert_eq!(late_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_earlier_callback_removing_later_one_skips_it() {
        let registry = Arc::new(ChangeRegistry::new());
        let (second_count, second_cb) = counter();
        let victim: Arc<Mutex<Option<ChangeToken>>> = Arc::new(Mutex::new(None));

        let reg = Arc::clone(&registry);
        let slot = Arc::clone(&victim);
        registry
            .register(
                "k",
                Arc::new(move |_: &str, _: &str, _: &Value| {
                    if let Some(token) = slot.lock().take() {
                        reg.unregister(token);
                    }
                }),
            )
            .unwrap();
        *victim.lock() = registry.register("k", second_cb);

        assert_eq!(registry.notify("k", "memory", &json!(1)), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_from_callback_stops_delivery() {
        let registry = Arc::new(ChangeRegistry::new());
        let (count, cb) = counter();

        let reg = Arc::clone(&registry);
        registry
            .register("k", Arc::new(move |_: &str, _: &str, _: &Value| reg.shutdown()))
            .unwrap();
        registry.register("k", cb).unwrap();

        assert_eq!(registry.notify("k", "memory", &json!(1)), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(registry.is_shut_down());
    }

    #[test]
    fn test_shutdown_waits_for_running_callback() {
        use std::sync::atomic::AtomicBool;
        use std::time::Duration;

        let registry = Arc::new(ChangeRegistry::new());
        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let s = Arc::clone(&started);
        let f = Arc::clone(&finished);
        registry
            .register(
                "k",
                Arc::new(move |_: &str, _: &str, _: &Value| {
                    s.store(true, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(100));
                    f.store(true, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let reg = Arc::clone(&registry);
        let deliverer = std::thread::spawn(move || reg.notify("k", "memory", &json!(1)));
        while !started.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }

        registry.shutdown();
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(deliverer.join().unwrap(), 1);
    }

    #[test]
    fn test_nested_delivery_then_self_shutdown() {
        let registry = Arc::new(ChangeRegistry::new());
        let (inner_count, inner_cb) = counter();
        registry.register("inner", inner_cb).unwrap();

        let reg = Arc::clone(&registry);
        registry
            .register(
                "outer",
                Arc::new(move |_: &str, _: &str, _: &Value| {
                    assert_eq!(reg.notify("inner", "memory", &json!(1)), 1);
                    reg.shutdown();
                }),
            )
            .unwrap();

        assert_eq!(registry.notify("outer", "memory", &json!(1)), 1);
        assert_eq!(inner_count.load(Ordering::SeqCst), 1);
        assert!(registry.is_shut_down());

        // The thread is no longer marked as delivering, so this waits normally
        registry.shutdown();
    }
}
