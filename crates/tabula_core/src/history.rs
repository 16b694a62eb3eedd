//! Operation history.
//!
//! The history records every applied insert, update and delete, in order.
//! It feeds single-step rollback and audit listings. Entries are never
//! modified once appended; the log only shrinks through an explicit clear
//! or when rollback retires its tail.

use crate::schema::Row;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a recorded operation.
///
/// Serialized as a lowercase string. A kind this engine does not produce
/// (only possible in a hand-edited or foreign snapshot) loads as
/// [`OperationKind::Unknown`] and makes rollback of that entry fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationKind {
    /// A row was inserted.
    Insert,
    /// A row was updated.
    Update,
    /// A row was deleted.
    Delete,
    /// Unrecognized kind read from a snapshot.
    Unknown(String),
}

impl OperationKind {
    /// Returns the kind's name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Unknown(kind) => kind,
        }
    }
}

impl From<String> for OperationKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "insert" => OperationKind::Insert,
            "update" => OperationKind::Update,
            "delete" => OperationKind::Delete,
            _ => OperationKind::Unknown(kind),
        }
    }
}

impl From<OperationKind> for String {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Unknown(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applied mutation.
///
/// - insert: `new_data` is the inserted row, `old_data` is `None`
/// - update: `old_data` is the pre-image, `new_data` the post-image
/// - delete: `old_data` is the removed row, `new_data` is empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// What kind of mutation this was.
    pub kind: OperationKind,
    /// The table it applied to.
    pub table_name: String,
    /// Row contents after the mutation.
    #[serde(default)]
    pub new_data: Row,
    /// Row contents before the mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_data: Option<Row>,
    /// When it was applied.
    pub timestamp: DateTime<Utc>,
}

impl Operation {
    /// Records an insert of `row`.
    pub fn insert(table_name: impl Into<String>, row: Row) -> Self {
        Self {
            kind: OperationKind::Insert,
            table_name: table_name.into(),
            new_data: row,
            old_data: None,
            timestamp: Utc::now(),
        }
    }

    /// Records an update from `old_data` to `new_data`.
    pub fn update(table_name: impl Into<String>, old_data: Row, new_data: Row) -> Self {
        Self {
            kind: OperationKind::Update,
            table_name: table_name.into(),
            new_data,
            old_data: Some(old_data),
            timestamp: Utc::now(),
        }
    }

    /// Records the deletion of `old_data`.
    pub fn delete(table_name: impl Into<String>, old_data: Row) -> Self {
        Self {
            kind: OperationKind::Delete,
            table_name: table_name.into(),
            new_data: Row::new(),
            old_data: Some(old_data),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only, thread-safe log of operations.
#[derive(Debug, Default)]
pub struct History {
    operations: RwLock<Vec<Operation>>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history holding `operations`, oldest first.
    #[must_use]
    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self {
            operations: RwLock::new(operations),
        }
    }

    /// Appends an operation.
    pub fn append(&self, operation: Operation) {
        self.operations.write().push(operation);
    }

    /// Returns a copy of all operations, oldest first.
    ///
    /// Later appends are not reflected in the returned vector.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operations.read().clone()
    }

    /// Returns a copy of the operations on `table_name`, oldest first.
    #[must_use]
    pub fn operations_for(&self, table_name: &str) -> Vec<Operation> {
        self.operations
            .read()
            .iter()
            .filter(|op| op.table_name == table_name)
            .cloned()
            .collect()
    }

    /// Returns the most recent operation.
    #[must_use]
    pub fn last(&self) -> Option<Operation> {
        self.operations.read().last().cloned()
    }

    /// Removes and returns the most recent operation.
    pub(crate) fn pop_last(&self) -> Option<Operation> {
        self.operations.write().pop()
    }

    /// Returns the number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.read().len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.read().is_empty()
    }

    /// Removes every operation.
    pub fn clear(&self) {
        self.operations.write().clear();
    }
}
