//! Snapshot encodings.

use crate::error::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The byte representation used for stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Pretty-printed JSON. Human-readable, the default.
    #[default]
    Json,
    /// CBOR via `ciborium`. Compact, binary.
    Cbor,
}

impl Encoding {
    /// Encodes `value` to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the value cannot be encoded.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> StorageResult<Vec<u8>> {
        match self {
            Encoding::Json => serde_json::to_vec_pretty(value)
                .map_err(|e| StorageError::serialization(e.to_string())),
            Encoding::Cbor => {
                let mut buf = Vec::new();
                ciborium::ser::into_writer(value, &mut buf)
                    .map_err(|e| StorageError::serialization(e.to_string()))?;
                Ok(buf)
            }
        }
    }

    /// Decodes a value read from `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Deserialization`] on malformed content.
    pub fn decode<T: DeserializeOwned>(self, key: &str, data: &[u8]) -> StorageResult<T> {
        match self {
            Encoding::Json => serde_json::from_slice(data)
                .map_err(|e| StorageError::deserialization(key, e.to_string())),
            Encoding::Cbor => ciborium::de::from_reader(data)
                .map_err(|e| StorageError::deserialization(key, e.to_string())),
        }
    }

    /// Returns the conventional file extension for this encoding.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::Cbor => "cbor",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Encoding::Json),
            "cbor" => Ok(Encoding::Cbor),
            other => Err(format!("unknown encoding: {other} (expected json or cbor)")),
        }
    }
}
