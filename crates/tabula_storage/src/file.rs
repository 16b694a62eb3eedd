//! File-based blob store for persistent storage.
//!
//! Each key maps to one file inside the data directory:
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK              # Advisory lock for single-writer
//! ├─ database.json     # One file per key
//! └─ database.json.tmp # Transient, only during a write
//! ```

use crate::backend::{validate_key, BlobStore};
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCK_FILE: &str = "LOCK";
const TEMP_SUFFIX: &str = ".tmp";

/// A directory-backed blob store.
///
/// Blobs survive process restarts. Writes go through a temporary file that
/// is renamed over the target, so a reader sees either the previous blob or
/// the new one, never a truncated file.
///
/// # Durability
///
/// With `sync_on_write` enabled (the default), every write syncs the
/// temporary file before the rename and syncs the directory after it.
///
/// # Thread Safety
///
/// The store holds an exclusive advisory lock on the directory for its
/// lifetime, and serializes writers internally.
///
/// # Example
///
/// ```no_run
/// use tabula_storage::{BlobStore, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("data")).unwrap();
/// store.write("database.json", b"{}").unwrap();
/// assert_eq!(store.read("database.json").unwrap(), Some(b"{}".to_vec()));
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    sync_on_write: bool,
    write_lock: Mutex<()>,
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a store rooted at `dir` with syncing enabled.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another process holds the
    /// directory, or an I/O error if it cannot be created.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        Self::open_with_options(dir, true)
    }

    /// Opens or creates a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another process holds the
    /// directory, or an I/O error if it cannot be created.
    pub fn open_with_options(dir: &Path, sync_on_write: bool) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;

        if !dir.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("path is not a directory: {}", dir.display()),
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }

        debug!(dir = %dir.display(), sync_on_write, "opened file store");

        Ok(Self {
            dir: dir.to_path_buf(),
            sync_on_write,
            write_lock: Mutex::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path used for `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{TEMP_SUFFIX}"))
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        File::open(&self.dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        // NTFS journals metadata; directory handles cannot be fsynced.
        Ok(())
    }
}

impl BlobStore for FileStore {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;

        let mut file = match File::open(self.path_for(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        if data.is_empty() {
            return Ok(None);
        }
        Ok(Some(data))
    }

    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let _guard = self.write_lock.lock();

        let temp_path = self.temp_path_for(key);
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        if self.sync_on_write {
            file.sync_all()?;
        }
        drop(file);

        fs::rename(&temp_path, self.path_for(key))?;
        if self.sync_on_write {
            self.sync_directory()?;
        }

        debug!(key, bytes = data.len(), "wrote blob");
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let _guard = self.write_lock.lock();

        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                if self.sync_on_write {
                    self.sync_directory()?;
                }
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
