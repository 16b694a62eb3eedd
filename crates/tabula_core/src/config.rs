//! Database configuration.

use tabula_storage::Encoding;

/// Default key the snapshot is stored under.
pub const DEFAULT_SNAPSHOT_KEY: &str = "database.json";

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key (file name inside the data directory) of the snapshot.
    pub snapshot_key: String,

    /// Encoding used for the snapshot.
    pub encoding: Encoding,

    /// Whether to fsync the snapshot and its directory on every save.
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            encoding: Encoding::Json,
            sync_on_write: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the snapshot key.
    #[must_use]
    pub fn snapshot_key(mut self, key: impl Into<String>) -> Self {
        self.snapshot_key = key.into();
        self
    }

    /// Sets the snapshot encoding.
    #[must_use]
    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets whether to sync on every save.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.snapshot_key, "database.json");
        assert_eq!(config.encoding, Encoding::Json);
        assert!(config.sync_on_write);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .snapshot_key("db.cbor")
            .encoding(Encoding::Cbor)
            .sync_on_write(false);

        assert_eq!(config.snapshot_key, "db.cbor");
        assert_eq!(config.encoding, Encoding::Cbor);
        assert!(!config.sync_on_write);
    }
}
