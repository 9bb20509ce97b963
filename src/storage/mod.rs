//! Key-value storage
//!
//! The cart and the API settings are persisted through a small async
//! string key-value interface, so the host can plug in whatever backend it
//! has. Two backends ship with the crate: [`MemoryStore`] and
//! [`JsonFileStore`].

use async_trait::async_trait;
use thiserror::Error;

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file did not contain a valid key-value map.
    #[error("storage file is not a valid key-value map: {0}")]
    Format(#[from] serde_json::Error),

    /// A backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Async string key-value store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
