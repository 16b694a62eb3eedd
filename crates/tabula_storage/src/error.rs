//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be encoded for storage.
    #[error("serialization failed: {message}")]
    Serialization {
        /// Description of the encoding failure.
        message: String,
    },

    /// Stored content could not be decoded.
    #[error("malformed content under key {key}: {message}")]
    Deserialization {
        /// The key whose blob was malformed.
        key: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// The key cannot be used as a blob name.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Another process holds the data directory.
    #[error("data directory locked: another process has exclusive access")]
    Locked,
}

impl StorageError {
    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a deserialization error for the given key.
    pub fn deserialization(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Deserialization {
            key: key.into(),
            message: message.into(),
        }
    }
}
