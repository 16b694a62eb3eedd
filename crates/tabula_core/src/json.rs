//! Plain JSON conversion for front ends.
//!
//! Transport layers exchange rows as ordinary JSON objects
//! (`{"id": 1, "name": "A"}`), unlike the tagged form used in snapshots.
//! Integral JSON numbers become [`Value::Int`], other numbers
//! [`Value::Float`]. Timestamps render as RFC 3339 strings; pass decoded
//! rows through [`crate::coerce_to_schema`] to turn them back into
//! timestamps.

use crate::error::{CoreError, CoreResult};
use crate::schema::Row;
use crate::value::Value;
use serde_json::{Map, Number, Value as Json};

/// Converts a JSON scalar to a value.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] for `null`, arrays and objects.
pub fn value_from_json(json: &Json) -> CoreResult<Value> {
    match json {
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => number_to_value(n),
        Json::Null => Err(CoreError::validation("null values are not supported")),
        Json::Array(_) | Json::Object(_) => Err(CoreError::validation(format!(
            "nested values are not supported: {json}"
        ))),
    }
}

fn number_to_value(n: &Number) -> CoreResult<Value> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    n.as_f64()
        .map(Value::Float)
        .ok_or_else(|| CoreError::validation(format!("unrepresentable number: {n}")))
}

/// Converts a value to JSON.
///
/// Non-finite floats have no JSON form and become `null`.
#[must_use]
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Int(i) => Json::from(*i),
        Value::Bool(b) => Json::Bool(*b),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Timestamp(t) => Json::String(t.to_rfc3339()),
    }
}

/// Converts a JSON object to a row (or condition set).
///
/// # Errors
///
/// Returns [`CoreError::Validation`] if `json` is not an object or holds
/// an unsupported value.
pub fn row_from_json(json: &Json) -> CoreResult<Row> {
    let object = json
        .as_object()
        .ok_or_else(|| CoreError::validation(format!("expected a JSON object, got {json}")))?;

    object
        .iter()
        .map(|(column, value)| {
            value_from_json(value)
                .map(|v| (column.clone(), v))
                .map_err(|e| CoreError::validation(format!("column {column}: {e}")))
        })
        .collect()
}

/// Converts a row to a JSON object.
#[must_use]
pub fn row_to_json(row: &Row) -> Json {
    let object: Map<String, Json> = row
        .iter()
        .map(|(column, value)| (column.clone(), value_to_json(value)))
        .collect();
    Json::Object(object)
}

/// Converts rows to a JSON array of objects.
#[must_use]
pub fn rows_to_json(rows: &[Row]) -> Json {
    Json::Array(rows.iter().map(row_to_json).collect())
}
