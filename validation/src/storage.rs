//! Persisted-storage seam.
//!
//! The host platform supplies the actual key-value backend (secure store,
//! app storage, a file); the pipeline only needs opaque string blobs under a
//! handful of well-known keys. [`MemoryStore`] is the in-process
//! implementation used by tests and by hosts without durable storage.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Bearer credential for the API (secure storage on device).
    pub const AUTH_TOKEN: &str = "zatix_auth_token";

    /// Logged-in crew member profile.
    pub const USER_DATA: &str = "zatix_user_data";

    /// Offline validation queue snapshot (whole list under one key).
    pub const VALIDATION_QUEUE: &str = "validation_queue";

    /// Validation history snapshot (whole list under one key).
    pub const VALIDATION_HISTORY: &str = "validation_history";
}

/// A storage backend failure.
///
/// Persistence failures never abort the user-visible flow: callers log them
/// and keep the in-memory state authoritative until the next successful
/// write.
#[derive(Debug, Error, Clone)]
pub enum StorageError {
    /// The backend rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Opaque string-blob storage.
///
/// Whole-value read/modify/write only; the pipeline is the sole writer of
/// its keys and never patches a value in place.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if present.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete the value under `key`; deleting a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// In-memory key-value store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let store = MemoryStore::new();

        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v1").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        // Removing a missing key is fine.
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn clones_share_the_same_backing_map() {
        let store = MemoryStore::new();
        let alias = store.clone();

        store.set("k", "v").await.unwrap();
        assert_eq!(alias.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
