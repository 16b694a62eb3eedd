//! History and rollback commands.

use super::CommandResult;
use std::io::Write;
use tabula_core::json::row_to_json;
use tabula_core::Database;

/// Runs the rollback command.
pub fn rollback(db: &Database, out: &mut dyn Write) -> CommandResult {
    let op = db.rollback()?;
    writeln!(out, "Rolled back {} on {}", op.kind, op.table_name)?;
    Ok(())
}

/// Runs the history command.
pub fn show(
    db: &Database,
    table: Option<&str>,
    format: &str,
    out: &mut dyn Write,
) -> CommandResult {
    let ops = match table {
        Some(table) => db.history_for(table),
        None => db.history(),
    };

    if format == "json" {
        let entries: Vec<serde_json::Value> = ops
            .iter()
            .map(|op| {
                serde_json::json!({
                    "kind": op.kind.as_str(),
                    "tableName": op.table_name,
                    "newData": row_to_json(&op.new_data),
                    "oldData": op.old_data.as_ref().map(row_to_json),
                    "timestamp": op.timestamp.to_rfc3339(),
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if ops.is_empty() {
        writeln!(out, "No operations in history")?;
        return Ok(());
    }

    writeln!(out, "Operation history:")?;
    for (i, op) in ops.iter().enumerate() {
        writeln!(
            out,
            "{}. {} on {} at {}",
            i + 1,
            op.kind,
            op.table_name,
            op.timestamp.to_rfc3339()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{row, Column, DataType};

    fn db() -> Database {
        let db = Database::open_in_memory("test").unwrap();
        db.create_table("t", vec![Column::new("n", DataType::Int)])
            .unwrap();
        db
    }

    #[test]
    fn empty_history() {
        let mut out = Vec::new();
        show(&db(), None, "text", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No operations in history\n");
    }

    #[test]
    fn text_history_and_rollback() {
        let db = db();
        db.insert("t", row! { "n" => 1 }).unwrap();
        db.delete("t", &row! { "n" => 1 }).unwrap();

        let mut out = Vec::new();
        show(&db, None, "text", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Operation history:\n1. insert on t at "));
        assert!(text.contains("\n2. delete on t at "));

        let mut out = Vec::new();
        rollback(&db, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Rolled back delete on t\n");
        assert_eq!(db.table("t").unwrap().len(), 1);
    }

    #[test]
    fn json_history() {
        let db = db();
        db.insert("t", row! { "n" => 5 }).unwrap();

        let mut out = Vec::new();
        show(&db, Some("t"), "json", &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json[0]["kind"], "insert");
        assert_eq!(json[0]["newData"]["n"], 5);
        assert!(json[0]["oldData"].is_null());
    }

    #[test]
    fn rollback_without_history_fails() {
        assert!(rollback(&db(), &mut Vec::new()).is_err());
    }
}
