//! Column schemas and rows.

use crate::error::{CoreError, CoreResult};
use crate::value::{DataType, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// One record: column name to value.
///
/// Key order carries no meaning; a `BTreeMap` keeps iteration deterministic.
pub type Row = BTreeMap<String, Value>;

/// A named, typed column. Immutable once its table exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// Declared type.
    #[serde(rename = "dataType", alias = "data_type", alias = "type")]
    pub data_type: DataType,
}

impl Column {
    /// Creates a column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.data_type)
    }
}

/// Parses `name:type`, e.g. `id:int`.
impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, data_type) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid column {s:?}: expected name:type"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("invalid column {s:?}: empty name"));
        }
        Ok(Column::new(name, data_type.parse()?))
    }
}

/// Checks a table definition before it is registered.
pub(crate) fn validate_definition(name: &str, columns: &[Column]) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("table name must not be empty"));
    }
    if columns.is_empty() {
        return Err(CoreError::validation(format!(
            "table {name} must declare at least one column"
        )));
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.name.is_empty() {
            return Err(CoreError::validation(format!(
                "table {name} has a column with an empty name"
            )));
        }
        if !seen.insert(column.name.as_str()) {
            return Err(CoreError::validation(format!(
                "table {name} declares column {} more than once",
                column.name
            )));
        }
    }
    Ok(())
}

/// Converts values toward the types `columns` declare.
///
/// Used by front ends that receive loosely typed input (JSON, clause text)
/// before handing it to the strict core: numbers are normalized to the
/// column's numeric variant and RFC 3339 strings become timestamps for
/// `timestamp` columns. Values that cannot be converted, and keys that are
/// not declared columns, pass through unchanged so that validation can
/// still report them.
#[must_use]
pub fn coerce_to_schema(columns: &[Column], values: Row) -> Row {
    values
        .into_iter()
        .map(|(key, value)| {
            let coerced = match columns.iter().find(|c| c.name == key) {
                Some(column) => coerce_value(column.data_type, value),
                None => value,
            };
            (key, coerced)
        })
        .collect()
}

fn coerce_value(data_type: DataType, value: Value) -> Value {
    match (data_type, value) {
        (DataType::Timestamp, Value::String(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
            .unwrap_or(Value::String(text)),
        (data_type, value) => data_type
            .normalize(value.clone())
            .unwrap_or(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn users() -> Vec<Column> {
        vec![
            Column::new("id", DataType::Int),
            Column::new("score", DataType::Float),
            Column::new("seen", DataType::Timestamp),
        ]
    }

    #[test]
    fn column_from_str() {
        let column: Column = "id:int".parse().unwrap();
        assert_eq!(column, Column::new("id", DataType::Int));

        assert!("id".parse::<Column>().is_err());
        assert!(":int".parse::<Column>().is_err());
        assert!("id:decimal".parse::<Column>().is_err());
    }

    #[test]
    fn column_json_uses_data_type_key() {
        let json = serde_json::to_string(&Column::new("id", DataType::Int)).unwrap();
        assert_eq!(json, r#"{"name":"id","dataType":"int"}"#);

        let parsed: Column = serde_json::from_str(r#"{"name":"id","type":"float"}"#).unwrap();
        assert_eq!(parsed.data_type, DataType::Float);
    }

    #[test]
    fn definition_checks() {
        assert!(validate_definition("users", &users()).is_ok());
        assert!(validate_definition("", &users()).is_err());
        assert!(validate_definition("users", &[]).is_err());

        let dup = vec![
            Column::new("id", DataType::Int),
            Column::new("id", DataType::String),
        ];
        assert!(matches!(
            validate_definition("users", &dup),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn coerce_numbers_and_timestamps() {
        let coerced = coerce_to_schema(
            &users(),
            row! {
                "id" => 4.0,
                "score" => 3,
                "seen" => "2024-05-01T12:00:00Z",
                "extra" => 1.5,
            },
        );

        assert_eq!(coerced["id"], Value::Int(4));
        assert_eq!(coerced["score"], Value::Float(3.0));
        assert!(matches!(coerced["seen"], Value::Timestamp(_)));
        assert_eq!(coerced["extra"], Value::Float(1.5));
    }

    #[test]
    fn coerce_leaves_mismatches_for_validation() {
        let coerced = coerce_to_schema(&users(), row! { "id" => "one", "seen" => "yesterday" });
        assert_eq!(coerced["id"], Value::from("one"));
        assert_eq!(coerced["seen"], Value::from("yesterday"));
    }
}
