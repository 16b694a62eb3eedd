//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tabula_core::{Config, Database};
use tabula_storage::{BlobStore, InMemoryStore, StorageResult};
use tempfile::TempDir;

/// Name given to every test database.
pub const TEST_DB_NAME: &str = "TestDB";

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self {
            db: Database::open_in_memory(TEST_DB_NAME).expect("Failed to open in-memory database"),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test database in a temporary directory.
    pub fn file() -> Self {
        Self::file_with_config(Config::default().sync_on_write(false))
    }

    /// Creates a new file-based test database with custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_with_config(TEST_DB_NAME, temp_dir.path(), config)
            .expect("Failed to open file database");

        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }

    /// Creates an in-memory test database whose snapshot writes can be made
    /// to fail.
    ///
    /// Setting the returned switch makes every later save fail until it is
    /// cleared again.
    pub fn flaky() -> (Self, Arc<AtomicBool>) {
        let store = FlakyStore::new();
        let switch = store.switch();
        let db = Database::open_with_store(TEST_DB_NAME, Box::new(store), Config::default())
            .expect("Failed to open flaky database");
        (
            Self {
                db,
                temp_dir: None,
            },
            switch,
        )
    }

    /// Returns the data directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Closes the database and opens it again from its snapshot.
    ///
    /// In-memory databases have nothing to reload from and come back empty.
    pub fn reopen(self) -> Self {
        let config = self.db.config().clone();
        let Self { db, temp_dir } = self;
        drop(db);

        match temp_dir {
            Some(temp_dir) => {
                let db = Database::open_with_config(TEST_DB_NAME, temp_dir.path(), config)
                    .expect("Failed to reopen file database");
                Self {
                    db,
                    temp_dir: Some(temp_dir),
                }
            }
            None => Self::memory(),
        }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// An in-memory blob store with switchable write failures.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    /// Creates a store that accepts writes until switched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the switch; while it is `true`, writes fail with an I/O error.
    pub fn switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_writes)
    }
}

impl BlobStore for FlakyStore {
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure").into());
        }
        self.inner.write(key, data)
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        self.inner.remove(key)
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use tabula_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     assert!(db.table_names().is_empty());
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db.path().expect("File database should have a path");
    f(&test_db.db, path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use tabula_core::{row, Column, DataType, Row};

    /// Columns of the `users` table: `id:int`, `name:string`, `active:bool`.
    pub fn users_columns() -> Vec<Column> {
        vec![
            Column::new("id", DataType::Int),
            Column::new("name", DataType::String),
            Column::new("active", DataType::Bool),
        ]
    }

    /// Builds a `users` row.
    pub fn user(id: i64, name: &str, active: bool) -> Row {
        row! { "id" => id, "name" => name, "active" => active }
    }

    /// Creates a database with a `users` table holding `count` rows.
    ///
    /// Row `i` (from 1) has id `i`, name `user{i}`, and is active when `i`
    /// is odd.
    pub fn populated_database(count: i64) -> TestDatabase {
        let db = TestDatabase::memory();
        db.create_table("users", users_columns())
            .expect("Failed to create users table");
        for i in 1..=count {
            db.insert("users", user(i, &format!("user{i}"), i % 2 == 1))
                .expect("Failed to insert user");
        }
        db
    }
}

#[cfg(test)]
mod tests {
    use super::scenarios::*;
    use super::*;
    use tabula_core::row;

    #[test]
    fn memory_database() {
        let db = TestDatabase::memory();
        assert!(db.path().is_none());
        assert_eq!(db.name(), TEST_DB_NAME);
    }

    #[test]
    fn file_database_reopens() {
        let db = TestDatabase::file();
        assert!(db.path().is_some());
        db.create_table("users", users_columns()).unwrap();
        db.insert("users", user(1, "A", true)).unwrap();

        let db = db.reopen();
        assert_eq!(db.table("users").unwrap().len(), 1);
        assert_eq!(db.history().len(), 1);
    }

    #[test]
    fn populated() {
        let db = populated_database(5);
        assert_eq!(db.table("users").unwrap().len(), 5);
        assert_eq!(db.select("users", &row! { "active" => true }).unwrap().len(), 3);
    }

    #[test]
    fn flaky_database_fails_while_switched() {
        let (db, switch) = TestDatabase::flaky();
        db.create_table("users", users_columns()).unwrap();

        switch.store(true, Ordering::SeqCst);
        assert!(db.insert("users", user(1, "A", true)).is_err());
        assert_eq!(db.table("users").unwrap().len(), 1);

        switch.store(false, Ordering::SeqCst);
        assert!(db.persist().is_ok());
    }

    #[test]
    fn with_helpers() {
        let count = with_temp_db(|db| db.table_names().len());
        assert_eq!(count, 0);

        with_file_db(|db, path| {
            db.create_table("users", users_columns()).unwrap();
            assert!(path.join("database.json").exists());
        });
    }
}
