//! The persisted image of a database.

use crate::history::Operation;
use crate::schema::{Column, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every table plus the full history, saved as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tables keyed by name.
    #[serde(default)]
    pub tables: BTreeMap<String, TableSnapshot>,
    /// The operation log, oldest first.
    #[serde(default)]
    pub history: Vec<Operation>,
}

/// Schema and rows of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name. Must equal its key in [`Snapshot::tables`].
    pub name: String,
    /// Declared columns.
    pub columns: Vec<Column>,
    /// Rows in table order.
    #[serde(default)]
    pub rows: Vec<Row>,
}
