//! In-memory blob store for testing.

use crate::backend::{validate_key, BlobStore};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory blob store.
///
/// This store keeps all blobs in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Example
///
/// ```rust
/// use tabula_storage::{BlobStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.write("k", b"test data").unwrap();
/// assert_eq!(store.read("k").unwrap(), Some(b"test data".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with one pre-existing blob.
    ///
    /// Useful for testing load and corruption scenarios.
    #[must_use]
    pub fn with_blob(key: impl Into<String>, data: Vec<u8>) -> Self {
        let store = Self::default();
        store.blobs.write().insert(key.into(), data);
        store
    }

    /// Returns the stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for InMemoryStore {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self
            .blobs
            .read()
            .get(key)
            .filter(|data| !data.is_empty())
            .cloned())
    }

    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.blobs.write().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.blobs.write().remove(key).is_some())
    }
}
