//! Configuration provider abstractions
//!
//! Core contracts:
//! - `Provider`: name, key lookup and scoping
//! - `DynamicProvider`: change callbacks with tokens and shutdown
//! - `ScopedProvider`: re-roots any provider under a key prefix
//!
//! Supports multiple configuration sources:
//! - `MemoryProvider`: In-memory value tree with change notification
//! - `EnvProvider`: Process environment variables
//! - `ProviderGroup`: Ordered fallback over several providers

mod error;
mod value;
mod traits;
mod scoped;
mod registry;
mod memory;
mod env;
mod group;

pub use error::{ConfigError, ConfigResult};
pub use value::ConfigValue;
pub use traits::{ChangeCallback, ChangeToken, DynamicProvider, Provider, SharedProvider};
pub use scoped::ScopedProvider;
pub use registry::ChangeRegistry;
pub use memory::MemoryProvider;
pub use env::EnvProvider;
pub use group::ProviderGroup;
