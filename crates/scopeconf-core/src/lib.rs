//! scopeconf core
//!
//! Configuration provider abstractions: any number of backing sources behind
//! one `Provider` trait, prefix scoping that re-roots a provider into a
//! sub-namespace, and a change subscription contract for sources that can
//! report live updates.
//!
//! ```rust
//! use std::sync::Arc;
//! use scopeconf_core::{DynamicProvider, MemoryProvider, Provider};
//! use serde_json::json;
//!
//! let root = Arc::new(MemoryProvider::from_value(json!({
//!     "applicationID": "svc1",
//!     "db": {"host": "localhost"}
//! })));
//!
//! // Lookups through a scope resolve under "db.<key>"
//! let db = root.clone().scope("db");
//! assert_eq!(db.get_value("host").as_str().unwrap(), "localhost");
//!
//! // Absence carries the full key
//! let missing = db.get_value("user").value().unwrap_err();
//! assert_eq!(missing.key(), Some("db.user"));
//!
//! // Live changes
//! let token = root
//!     .register_change_callback("db.host", Arc::new(|key: &str, _: &str, value: &serde_json::Value| {
//!         println!("{key} is now {value}");
//!     }))
//!     .unwrap();
//! root.set("db.host", json!("10.0.0.1"));
//! assert!(root.unregister_change_callback(token));
//! root.shutdown();
//! ```

pub mod logging;
pub mod config;
pub mod testutils;

pub use config::{
    ChangeCallback, ChangeRegistry, ChangeToken, ConfigError, ConfigResult, ConfigValue,
    DynamicProvider, EnvProvider, MemoryProvider, Provider, ProviderGroup, ScopedProvider,
    SharedProvider,
};

pub use logging::{ConsoleLogger, Logger, NoOpLogger, SharedLogger};
