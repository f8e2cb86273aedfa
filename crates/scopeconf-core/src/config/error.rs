//! Configuration error types

use thiserror::Error;

/// Errors that can occur when reading configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No provider in the lookup chain had a value for the key
    #[error("couldn't find key {key:?}")]
    KeyNotFound { key: String },

    /// The value exists but cannot be read as the requested type
    #[error("value for {key:?} is not of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// The value exists but failed to deserialize into the requested type
    #[error("failed to deserialize {key:?}: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ConfigError {
    /// Create a key not found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(key: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
        }
    }

    /// Create a deserialization error
    pub fn deserialize(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Deserialize {
            key: key.into(),
            source,
        }
    }

    /// The key this error refers to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::KeyNotFound { key }
            | Self::TypeMismatch { key, .. }
            | Self::Deserialize { key, .. } => Some(key),
            Self::Other(_) => None,
        }
    }

    /// Whether this error only signals an absent key
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
