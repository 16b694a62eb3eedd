//! Blob store trait definition.

use crate::error::{StorageError, StorageResult};

/// A low-level named blob store for Tabula.
///
/// Blob stores are **opaque byte stores**. They keep one byte blob per key
/// and provide whole-blob reads and writes. Tabula owns all interpretation
/// of the bytes - stores do not understand tables, rows, or history.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write` for a key
/// - `read` of a key that was never written returns `Ok(None)`, not an error
/// - A concurrent `read` never observes a partially written blob
/// - Stores must be `Send + Sync` and use interior locking
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait BlobStore: Send + Sync {
    /// Reads the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the blob stored under `key` with `data`.
    ///
    /// After this returns successfully the new blob is visible to readers
    /// and, for durable stores, survives process termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes the blob stored under `key`.
    ///
    /// Returns `true` if a blob was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Returns `true` if a blob is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.read(key)?.is_some())
    }
}

/// Checks that `key` is usable as a blob name.
///
/// Keys are plain names: non-empty, no path separators, not `.` or `..`,
/// and not ending in the temporary-file suffix used by [`super::FileStore`].
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] if the key is rejected.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key == "." || key == ".." {
        Some("key is a relative path component")
    } else if key.contains(['/', '\\', '\0']) {
        Some("key contains a path separator")
    } else if key.ends_with(".tmp") {
        Some("key uses the reserved .tmp suffix")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_valid() {
        assert!(validate_key("database.json").is_ok());
        assert!(validate_key("snapshot").is_ok());
    }

    #[test]
    fn path_like_names_are_rejected() {
        for key in ["", ".", "..", "a/b", "a\\b", "../escape", "database.json.tmp"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey { .. })),
                "{key:?} should be rejected"
            );
        }
    }
}
