//! Typed save/load over a blob store.

use crate::backend::BlobStore;
use crate::encoding::Encoding;
use crate::error::StorageResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Typed persistence of named values.
///
/// `Storage` owns a [`BlobStore`] and an [`Encoding`]. It has no knowledge
/// of what it stores: callers hand it any serializable value and a key.
pub struct Storage {
    store: Box<dyn BlobStore>,
    encoding: Encoding,
}

impl Storage {
    /// Creates a storage handle over `store`.
    #[must_use]
    pub fn new(store: Box<dyn BlobStore>, encoding: Encoding) -> Self {
        Self { store, encoding }
    }

    /// Returns the encoding used for stored values.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Encodes `value` and writes it under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the backend write fails.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let bytes = self.encoding.encode(value)?;
        self.store.write(key, &bytes)?;
        debug!(key, bytes = bytes.len(), encoding = %self.encoding, "saved value");
        Ok(())
    }

    /// Reads and decodes the value stored under `key`.
    ///
    /// A key that has never been written is not an error: it yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Deserialization`] if the stored bytes are
    /// malformed, or an I/O error from the backend.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.store.read(key)? {
            Some(bytes) => {
                let value = self.encoding.decode(key, &bytes)?;
                debug!(key, bytes = bytes.len(), "loaded value");
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::{FileStore, InMemoryStore};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn load_missing_is_none() {
        let storage = Storage::new(Box::new(InMemoryStore::new()), Encoding::Json);
        let loaded: Option<Vec<u32>> = storage.load("database.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load() {
        let storage = Storage::new(Box::new(InMemoryStore::new()), Encoding::Cbor);

        let mut value = BTreeMap::new();
        value.insert("users".to_string(), vec![1u32, 2, 3]);
        storage.save("snapshot", &value).unwrap();

        let loaded: Option<BTreeMap<String, Vec<u32>>> = storage.load("snapshot").unwrap();
        assert_eq!(loaded, Some(value));
    }

    #[test]
    fn corrupt_content_is_an_error() {
        let store = InMemoryStore::with_blob("database.json", b"[1, 2,".to_vec());
        let storage = Storage::new(Box::new(store), Encoding::Json);

        let result: StorageResult<Option<Vec<u32>>> = storage.load("database.json");
        assert!(matches!(result, Err(StorageError::Deserialization { .. })));
    }

    #[test]
    fn file_backed_round_trip() {
        let temp = tempdir().unwrap();

        {
            let store = FileStore::open(temp.path()).unwrap();
            let storage = Storage::new(Box::new(store), Encoding::Json);
            storage.save("database.json", &vec!["a", "b"]).unwrap();
        }

        let store = FileStore::open(temp.path()).unwrap();
        let storage = Storage::new(Box::new(store), Encoding::Json);
        let loaded: Option<Vec<String>> = storage.load("database.json").unwrap();
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
