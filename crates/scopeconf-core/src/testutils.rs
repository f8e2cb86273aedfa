//! Helpers for tests that need a throwaway configuration
//!
//! Configs are returned as explicit handles; nothing is installed globally, so
//! each test can build as many independent provider trees as it needs.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::config::{ChangeCallback, MemoryProvider, Provider, ProviderGroup};

/// Name of the group returned by [`with_config`]
pub const TEST_GROUP_NAME: &str = "test";

/// Build a test configuration exposing `applicationID`
///
/// The config is a [`ProviderGroup`] named `"test"` over a single
/// [`MemoryProvider`]. Without an explicit id a random one is generated.
///
/// ```
/// use scopeconf_core::testutils::with_config;
///
/// let config = with_config(Some("svc1"));
/// assert_eq!(config.get_value("applicationID").as_str().unwrap(), "svc1");
/// ```
pub fn with_config(application_id: Option<&str>) -> Arc<dyn Provider> {
    let application_id = match application_id {
        Some(id) => id.to_string(),
        None => random_application_id(),
    };
    let memory: Arc<dyn Provider> =
        Arc::new(MemoryProvider::from_value(json!({ "applicationID": application_id })));
    Arc::new(ProviderGroup::new(TEST_GROUP_NAME, vec![memory]))
}

const ID_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `"test"` followed by 10 random ASCII letters
pub fn random_application_id() -> String {
    let random = uuid::Uuid::new_v4();
    let suffix: String = random.as_bytes()[..10]
        .iter()
        .map(|byte| ID_LETTERS[*byte as usize % ID_LETTERS.len()] as char)
        .collect();
    format!("test{suffix}")
}

/// One observed change: `(key, provider_name, new_value)`
pub type RecordedChange = (String, String, Value);

/// Change callback that remembers every invocation
///
/// ```
/// use scopeconf_core::config::{DynamicProvider, MemoryProvider};
/// use scopeconf_core::testutils::RecordingCallback;
/// use serde_json::json;
///
/// let config = MemoryProvider::new();
/// let recorder = RecordingCallback::new();
/// config.register_change_callback("k", recorder.callback());
///
/// config.set("k", json!(1));
/// assert_eq!(recorder.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingCallback {
    seen: Arc<Mutex<Vec<RecordedChange>>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback feeding this recorder; may be registered many times
    pub fn callback(&self) -> ChangeCallback {
        let seen = Arc::clone(&self.seen);
        Arc::new(move |key: &str, provider: &str, value: &Value| {
            seen.lock()
                .push((key.to_string(), provider.to_string(), value.clone()));
        })
    }

    /// Everything recorded so far, in delivery order
    pub fn changes(&self) -> Vec<RecordedChange> {
        self.seen.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DynamicProvider;

    #[test]
    fn test_with_explicit_id() {
        let config = with_config(Some("svc1"));
        assert_eq!(config.name(), TEST_GROUP_NAME);
        assert_eq!(config.get_value("applicationID").as_str().unwrap(), "svc1");
    }

    #[test]
    fn test_with_random_id() {
        let config = with_config(None);
        let id = config.get_value("applicationID").as_str().unwrap().to_string();
        assert!(id.starts_with("test"));
        assert_eq!(id.len(), 14);
    }

    #[test]
    fn test_random_id_suffix_is_letters() {
        for _ in 0..20 {
            let id = random_application_id();
            assert!(id["test".len()..].chars().all(|c| c.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn test_configs_are_independent() {
        let a = with_config(None);
        let b = with_config(None);
        assert_ne!(
            a.get_value("applicationID").raw(),
            b.get_value("applicationID").raw()
        );
    }

    #[test]
    fn test_recording_callback() {
        let config = MemoryProvider::new();
        let recorder = RecordingCallback::new();
        config.register_change_callback("a", recorder.callback()).unwrap();
        config.register_change_callback("a", recorder.callback()).unwrap();

        config.set("a", json!("x"));
        assert_eq!(recorder.len(), 2);
        assert_eq!(
            recorder.changes()[0],
            ("a".to_string(), "memory".to_string(), json!("x"))
        );

        recorder.clear();
        assert!(recorder.is_empty());
    }
}
