//! Key/value store port
//!
//! Defines the interface of a host persistence scope.

use async_trait::async_trait;
use serde_json::Value;

/// Errors that can occur when writing to a scope.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store refused the write (quota, read-only, ...).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// One persistence scope of the host.
///
/// Reads are synchronous and never fail. Writes replace the whole value
/// stored under a key and may fail.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Option<Value>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the value could not be persisted.
    async fn update(&self, key: &str, value: Value) -> Result<(), StoreError>;
}
