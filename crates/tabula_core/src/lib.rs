//! # Tabula Core
//!
//! Core table engine for Tabula.
//!
//! This crate provides:
//! - Typed values and fixed column schemas
//! - Tables with schema-validated insert, select, update and delete
//! - Equality-conjunction conditions and a `WHERE` clause parser
//! - An operation history with single-step rollback
//! - Whole-database snapshots persisted after every mutation
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::{row, Column, DataType, Database};
//!
//! let db = Database::open_in_memory("example").unwrap();
//! db.create_table(
//!     "users",
//!     vec![
//!         Column::new("id", DataType::Int),
//!         Column::new("name", DataType::String),
//!         Column::new("active", DataType::Bool),
//!     ],
//! )
//! .unwrap();
//!
//! db.insert("users", row! { "id" => 1, "name" => "A", "active" => true }).unwrap();
//! db.insert("users", row! { "id" => 2, "name" => "B", "active" => false }).unwrap();
//!
//! let active = db.select("users", &row! { "active" => true }).unwrap();
//! assert_eq!(active.len(), 1);
//!
//! db.rollback().unwrap();
//! assert_eq!(db.select("users", &row! {}).unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod condition;
mod config;
mod database;
mod error;
mod history;
pub mod json;
mod schema;
mod snapshot;
mod table;
mod value;

pub use condition::{match_conditions, parse_value, parse_where_clause, Conditions};
pub use config::{Config, DEFAULT_SNAPSHOT_KEY};
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use history::{History, Operation, OperationKind};
pub use schema::{coerce_to_schema, Column, Row};
pub use snapshot::{Snapshot, TableSnapshot};
pub use table::Table;
pub use value::{DataType, Value};

pub use tabula_storage::Encoding;

/// Builds a [`Row`] (or [`Conditions`]) from `column => value` pairs.
///
/// Values go through [`Value::from`], so plain literals work.
///
/// ```rust
/// use tabula_core::{row, Value};
///
/// let r = row! { "id" => 1, "name" => "A" };
/// assert_eq!(r.get("id"), Some(&Value::Int(1)));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $(
            row.insert(::std::string::String::from($column), $crate::Value::from($value));
        )+
        row
    }};
}
