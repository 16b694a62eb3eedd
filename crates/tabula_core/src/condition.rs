//! Equality conditions and the `WHERE` clause parser.
//!
//! A condition set is a conjunction of `column = value` tests. The textual
//! form is `col1=val1 AND col2=val2`: no `OR`, no parentheses, no other
//! operators.

use crate::error::{CoreError, CoreResult};
use crate::schema::Row;
use crate::value::Value;

/// Column name to required value. Empty matches every row.
pub type Conditions = Row;

const AND: &str = "AND";

/// Returns true if every condition holds for `row`.
///
/// A condition holds when `row` has the column and its value is exactly
/// equal to the required value. No cross-type coercion takes place.
#[must_use]
pub fn match_conditions(row: &Row, conditions: &Conditions) -> bool {
    conditions
        .iter()
        .all(|(column, expected)| row.get(column) == Some(expected))
}

/// Parses `col1=val1 AND col2=val2 ...` into conditions.
///
/// Conjuncts are separated by the case-sensitive token `AND` standing
/// between whitespace. Each conjunct needs exactly one `=`; the right-hand
/// side is classified by [`parse_value`]. Blank input yields no conditions.
///
/// # Errors
///
/// Returns [`CoreError::Parse`] for a conjunct with zero or several `=`,
/// or with nothing left of the `=`.
///
/// # Example
///
/// ```rust
/// use tabula_core::{parse_where_clause, Value};
///
/// let conditions = parse_where_clause("id=1 AND active=true").unwrap();
/// assert_eq!(conditions["id"], Value::Int(1));
/// assert_eq!(conditions["active"], Value::Bool(true));
///
/// assert!(parse_where_clause("id=1=2").is_err());
/// ```
pub fn parse_where_clause(text: &str) -> CoreResult<Conditions> {
    let mut conditions = Conditions::new();

    for part in split_conjuncts(text) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let mut sides = part.split('=');
        let (column, value) = match (sides.next(), sides.next(), sides.next()) {
            (Some(column), Some(value), None) => (column.trim(), value.trim()),
            _ => return Err(CoreError::parse(format!("invalid condition: {part}"))),
        };
        if column.is_empty() {
            return Err(CoreError::parse(format!("missing column name: {part}")));
        }

        conditions.insert(column.to_string(), parse_value(value));
    }

    Ok(conditions)
}

/// Classifies clause text as a typed value.
///
/// Surrounding quote characters are stripped first, then the text is tried
/// as, in order: `true`/`false`, an integer, a finite float. Anything else
/// (including `NaN` and `inf`) is a string.
#[must_use]
pub fn parse_value(text: &str) -> Value {
    let text = text.trim_matches(|c| c == '"' || c == '\'');

    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    Value::String(text.to_string())
}

/// Splits on `AND` tokens delimited by whitespace or the ends of `text`.
fn split_conjuncts(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut from = 0;

    while let Some(offset) = text[from..].find(AND) {
        let at = from + offset;
        let end = at + AND.len();
        let bounded_before = at == 0 || bytes[at - 1].is_ascii_whitespace();
        let bounded_after = end == bytes.len() || bytes[end].is_ascii_whitespace();

        if bounded_before && bounded_after {
            parts.push(&text[start..at]);
            start = end;
        }
        from = end;
    }

    parts.push(&text[start..]);
    parts
}
