//! Database facade: table namespace, persistence and rollback.

use crate::condition::Conditions;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::history::{History, Operation, OperationKind};
use crate::schema::{Column, Row};
use crate::snapshot::Snapshot;
use crate::table::Table;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tabula_storage::{BlobStore, FileStore, InMemoryStore, Storage, StorageError};
use tracing::{debug, info, warn};

/// The main database handle.
///
/// `Database` owns every [`Table`] and the operation [`History`]. Each
/// mutating call validates its input, applies the change in memory, records
/// it, then saves a snapshot of the whole database before returning.
///
/// # Opening a Database
///
/// ```rust,no_run
/// use tabula_core::Database;
/// use std::path::Path;
///
/// // Loads ./data/database.json if present, otherwise starts empty
/// let db = Database::open("MyDB", Path::new("data"))?;
/// # Ok::<(), tabula_core::CoreError>(())
/// ```
///
/// # Persistence Failures
///
/// If the snapshot cannot be written, the mutating call returns
/// [`CoreError::Persistence`] but its in-memory effect stays applied. The
/// next successful save includes it.
///
/// # Locking
///
/// Table mutations hold the namespace read lock plus the table's own write
/// lock, so mutations on different tables run concurrently. Table creation
/// and rollback take the namespace write lock. Saves are serialized by a
/// separate mutex and run after the namespace lock is released.
pub struct Database {
    name: String,
    config: Config,
    tables: RwLock<HashMap<String, Arc<Table>>>,
    history: History,
    storage: Storage,
    persist_lock: Mutex<()>,
}

impl Database {
    /// Opens a database stored in the directory `path`.
    ///
    /// The directory is created if needed and locked for exclusive use by
    /// this process.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Persistence`] if the directory is locked by
    /// another process, cannot be created, or holds a corrupt snapshot.
    pub fn open(name: impl Into<String>, path: &Path) -> CoreResult<Self> {
        Self::open_with_config(name, path, Config::default())
    }

    /// Opens a database stored in `path` with custom configuration.
    ///
    /// # Errors
    ///
    /// See [`Database::open`].
    pub fn open_with_config(
        name: impl Into<String>,
        path: &Path,
        config: Config,
    ) -> CoreResult<Self> {
        let store = FileStore::open_with_options(path, config.sync_on_write)?;
        Self::open_with_store(name, Box::new(store), config)
    }

    /// Opens a database that keeps its snapshot in memory only.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other openers.
    pub fn open_in_memory(name: impl Into<String>) -> CoreResult<Self> {
        Self::open_with_store(name, Box::new(InMemoryStore::new()), Config::default())
    }

    /// Opens a database over an arbitrary blob store.
    ///
    /// If the store holds a snapshot under [`Config::snapshot_key`] it is
    /// loaded and checked: every table must sit under its own name and
    /// every row must satisfy its table's schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Persistence`] if the snapshot cannot be read or
    /// fails those checks.
    pub fn open_with_store(
        name: impl Into<String>,
        store: Box<dyn BlobStore>,
        config: Config,
    ) -> CoreResult<Self> {
        let name = name.into();
        let storage = Storage::new(store, config.encoding);

        let snapshot: Snapshot = storage.load(&config.snapshot_key)?.unwrap_or_default();
        let (tables, history) = Self::restore(&config.snapshot_key, snapshot)?;

        info!(
            database = %name,
            tables = tables.len(),
            history = history.len(),
            encoding = %config.encoding,
            "opened database"
        );

        Ok(Self {
            name,
            config,
            tables: RwLock::new(tables),
            history,
            storage,
            persist_lock: Mutex::new(()),
        })
    }

    fn restore(
        key: &str,
        snapshot: Snapshot,
    ) -> CoreResult<(HashMap<String, Arc<Table>>, History)> {
        let mut tables = HashMap::with_capacity(snapshot.tables.len());

        for (table_key, table) in snapshot.tables {
            if table.name != table_key {
                return Err(StorageError::deserialization(
                    key,
                    format!("table entry {table_key} holds table {}", table.name),
                )
                .into());
            }
            let table = Table::from_snapshot(table)
                .map_err(|e| StorageError::deserialization(key, e.to_string()))?;
            tables.insert(table_key, Arc::new(table));
        }

        Ok((tables, History::from_operations(snapshot.history)))
    }

    /// Returns the database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates an empty table and persists.
    ///
    /// Names are case-sensitive.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TableExists`] if `name` is taken
    /// - [`CoreError::Validation`] for an empty name, no columns, or a
    ///   repeated column name
    /// - [`CoreError::Persistence`] if the snapshot cannot be saved (the
    ///   table is still created)
    pub fn create_table(&self, name: &str, columns: Vec<Column>) -> CoreResult<()> {
        {
            let mut tables = self.tables.write();
            if tables.contains_key(name) {
                return Err(CoreError::table_exists(name));
            }
            let table = Table::new(name, columns)?;
            info!(table = name, columns = table.columns().len(), "created table");
            tables.insert(name.to_string(), Arc::new(table));
        }
        self.persist_after("create table")
    }

    /// Returns a read-only handle to the table `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if no such table exists.
    pub fn table(&self, name: &str) -> CoreResult<Arc<Table>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::table_not_found(name))
    }

    /// Returns the names of all tables, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Inserts `row` into `table` and persists.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TableNotFound`] if the table does not exist
    /// - [`CoreError::Validation`] if the row does not satisfy the schema
    /// - [`CoreError::Persistence`] if the snapshot cannot be saved (the
    ///   row is still inserted)
    pub fn insert(&self, table: &str, row: Row) -> CoreResult<()> {
        self.with_table(table, |t| t.insert(row, &self.history))?;
        self.persist_after("insert")
    }

    /// Returns the rows of `table` matching `conditions`.
    ///
    /// Reads never record history or touch storage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TableNotFound`] if the table does not exist.
    pub fn select(&self, table: &str, conditions: &Conditions) -> CoreResult<Vec<Row>> {
        self.with_table(table, |t| Ok(t.select(conditions)))
    }

    /// Applies `updates` to every row of `table` matching `conditions`.
    ///
    /// Returns the number of rows changed. Persists only if at least one
    /// row changed. Every update key and value is checked before any row is
    /// modified, so a failed call has no effect.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TableNotFound`] if the table does not exist
    /// - [`CoreError::UnknownColumn`] if an update names an undeclared column
    /// - [`CoreError::Validation`] if an update value has the wrong type
    /// - [`CoreError::Persistence`] if the snapshot cannot be saved
    pub fn update(&self, table: &str, conditions: &Conditions, updates: Row) -> CoreResult<usize> {
        let updated = self.with_table(table, |t| t.update(conditions, updates, &self.history))?;
        if updated > 0 {
            self.persist_after("update")?;
        }
        Ok(updated)
    }

    /// Removes every row of `table` matching `conditions` and persists.
    ///
    /// Returns the number of rows removed. Each removed row gets its own
    /// history entry, so undoing a delete of K rows takes K rollbacks.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TableNotFound`] if the table does not exist
    /// - [`CoreError::Persistence`] if the snapshot cannot be saved
    pub fn delete(&self, table: &str, conditions: &Conditions) -> CoreResult<usize> {
        let deleted = self.with_table(table, |t| Ok(t.delete(conditions, &self.history)))?;
        self.persist_after("delete")?;
        Ok(deleted)
    }

    /// Undoes the most recent operation and persists.
    ///
    /// The inverse is applied directly, without schema validation. On
    /// success the entry is removed from the history, so repeated calls
    /// walk further back. On failure the history is left untouched.
    ///
    /// Returns the operation that was undone.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoHistory`] if the history is empty
    /// - [`CoreError::TableNotFound`] if the entry's table is gone
    /// - [`CoreError::RowNotFound`] if the row to restore has since changed
    /// - [`CoreError::UnknownOperation`] for an entry of unknown kind
    /// - [`CoreError::Persistence`] if the snapshot cannot be saved
    pub fn rollback(&self) -> CoreResult<Operation> {
        let undone = {
            let tables = self.tables.write();
            let op = self.history.last().ok_or(CoreError::NoHistory)?;
            let table = tables
                .get(&op.table_name)
                .ok_or_else(|| CoreError::table_not_found(&op.table_name))?;

            match &op.kind {
                OperationKind::Insert => table.rollback_insert(&op.new_data)?,
                OperationKind::Update => {
                    let old = op
                        .old_data
                        .as_ref()
                        .ok_or_else(|| CoreError::row_not_found(&op.table_name))?;
                    table.rollback_update(&op.new_data, old)?;
                }
                OperationKind::Delete => {
                    let old = op
                        .old_data
                        .clone()
                        .ok_or_else(|| CoreError::row_not_found(&op.table_name))?;
                    table.rollback_delete(old);
                }
                OperationKind::Unknown(kind) => {
                    return Err(CoreError::UnknownOperation { kind: kind.clone() });
                }
            }

            self.history.pop_last();
            op
        };

        info!(
            kind = %undone.kind,
            table = %undone.table_name,
            remaining = self.history.len(),
            "rolled back operation"
        );
        self.persist_after("rollback")?;
        Ok(undone)
    }

    /// Returns a copy of the full history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Operation> {
        self.history.operations()
    }

    /// Returns a copy of the history entries for `table`, oldest first.
    #[must_use]
    pub fn history_for(&self, table: &str) -> Vec<Operation> {
        self.history.operations_for(table)
    }

    /// Empties the history and persists. Table contents are unaffected.
    ///
    /// Holds the table map exclusively, so it never lands inside a rollback.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Persistence`] if the snapshot cannot be saved.
    pub fn clear_history(&self) -> CoreResult<()> {
        let cleared = {
            let _tables = self.tables.write();
            let cleared = self.history.len();
            self.history.clear();
            cleared
        };
        info!(cleared, "cleared history");
        self.persist_after("clear history")
    }

    /// Captures every table and the history.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read();
        Snapshot {
            tables: tables
                .iter()
                .map(|(name, table)| (name.clone(), table.to_snapshot()))
                .collect(),
            history: self.history.operations(),
        }
    }

    /// Saves a snapshot of the current state.
    ///
    /// Mutating calls do this automatically; an explicit call retries after
    /// an earlier persistence failure.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Persistence`] if the snapshot cannot be saved.
    pub fn persist(&self) -> CoreResult<()> {
        let _guard = self.persist_lock.lock();
        let snapshot = self.snapshot();
        self.storage.save(&self.config.snapshot_key, &snapshot)?;
        debug!(
            key = %self.config.snapshot_key,
            tables = snapshot.tables.len(),
            history = snapshot.history.len(),
            "persisted snapshot"
        );
        Ok(())
    }

    fn persist_after(&self, operation: &str) -> CoreResult<()> {
        self.persist().map_err(|e| {
            warn!(operation, error = %e, "change applied in memory but not persisted");
            e
        })
    }

    fn with_table<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Table) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let tables = self.tables.read();
        let table = tables
            .get(name)
            .ok_or_else(|| CoreError::table_not_found(name))?;
        f(table)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("tables", &self.table_names())
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}
