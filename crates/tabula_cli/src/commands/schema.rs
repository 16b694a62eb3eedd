//! Table commands.

use super::CommandResult;
use std::io::Write;
use tabula_core::{Column, Database};

/// Runs the create-table command.
pub fn create_table(
    db: &Database,
    table: &str,
    columns: Vec<Column>,
    out: &mut dyn Write,
) -> CommandResult {
    db.create_table(table, columns)?;
    writeln!(out, "Table {table} created")?;
    Ok(())
}

/// Runs the tables command: one line per table with its schema.
pub fn tables(db: &Database, out: &mut dyn Write) -> CommandResult {
    let names = db.table_names();
    if names.is_empty() {
        writeln!(out, "No tables")?;
        return Ok(());
    }

    for name in names {
        let table = db.table(&name)?;
        let columns: Vec<String> = table.columns().iter().map(ToString::to_string).collect();
        writeln!(
            out,
            "{name} ({}) - {} rows",
            columns.join(", "),
            table.len()
        )?;
    }
    Ok(())
}
