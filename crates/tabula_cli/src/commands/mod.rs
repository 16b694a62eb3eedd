//! CLI command implementations.

pub mod history;
pub mod rows;
pub mod schema;
pub mod serve;

use std::error::Error;
use std::path::Path;
use tabula_core::{coerce_to_schema, parse_where_clause, Column, Conditions, Database};
use tracing::debug;

/// Result type shared by the commands.
pub type CommandResult<T = ()> = Result<T, Box<dyn Error>>;

/// Opens the database in `data_dir`.
pub fn open(data_dir: &Path, name: &str) -> CommandResult<Database> {
    debug!(database = name, data_dir = %data_dir.display(), "opening database");
    Database::open(name, data_dir)
        .map_err(|e| format!("cannot open database in {}: {e}", data_dir.display()).into())
}

/// Parses optional clause text into conditions typed for `columns`.
fn clause(text: Option<&str>, columns: &[Column]) -> CommandResult<Conditions> {
    let conditions = match text {
        Some(text) => parse_where_clause(text)?,
        None => Conditions::new(),
    };
    Ok(coerce_to_schema(columns, conditions))
}
