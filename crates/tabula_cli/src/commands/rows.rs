//! Row commands.

use super::{clause, CommandResult};
use std::io::Write;
use tabula_core::json::{row_from_json, rows_to_json};
use tabula_core::{coerce_to_schema, parse_where_clause, Column, Database, Row};

/// Runs the insert command. `json` must be a JSON object.
pub fn insert(db: &Database, table: &str, json: &str, out: &mut dyn Write) -> CommandResult {
    let columns = db.table(table)?.columns().to_vec();
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("invalid row JSON: {e}"))?;
    let row = coerce_to_schema(&columns, row_from_json(&value)?);

    db.insert(table, row)?;
    writeln!(out, "Row inserted")?;
    Ok(())
}

/// Runs the select command.
pub fn select(
    db: &Database,
    table: &str,
    where_clause: Option<&str>,
    format: &str,
    out: &mut dyn Write,
) -> CommandResult {
    let columns = db.table(table)?.columns().to_vec();
    let conditions = clause(where_clause, &columns)?;
    let rows = db.select(table, &conditions)?;

    match format {
        "json" => {
            writeln!(out, "{}", serde_json::to_string_pretty(&rows_to_json(&rows))?)?;
        }
        _ => {
            for row in &rows {
                writeln!(out, "{}", format_row(row, &columns))?;
            }
            writeln!(out, "({} rows)", rows.len())?;
        }
    }
    Ok(())
}

/// Runs the update command. `set` uses clause syntax: `a=1 AND b=x`.
pub fn update(
    db: &Database,
    table: &str,
    set: &str,
    where_clause: Option<&str>,
    out: &mut dyn Write,
) -> CommandResult {
    let columns = db.table(table)?.columns().to_vec();
    let conditions = clause(where_clause, &columns)?;
    let updates = coerce_to_schema(&columns, parse_where_clause(set)?);
    if updates.is_empty() {
        return Err("nothing to set".into());
    }

    let updated = db.update(table, &conditions, updates)?;
    writeln!(out, "{updated} rows updated")?;
    Ok(())
}

/// Runs the delete command.
pub fn delete(
    db: &Database,
    table: &str,
    where_clause: Option<&str>,
    out: &mut dyn Write,
) -> CommandResult {
    let columns = db.table(table)?.columns().to_vec();
    let conditions = clause(where_clause, &columns)?;

    let deleted = db.delete(table, &conditions)?;
    writeln!(out, "{deleted} rows deleted")?;
    Ok(())
}

/// Formats a row as `col=value` pairs, declared columns first.
pub fn format_row(row: &Row, columns: &[Column]) -> String {
    let declared = columns
        .iter()
        .filter_map(|c| row.get_key_value(&c.name));
    let extra = row
        .iter()
        .filter(|(key, _)| !columns.iter().any(|c| &c.name == *key));

    declared
        .chain(extra)
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}
