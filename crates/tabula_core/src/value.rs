//! Typed column values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// UTF-8 text.
    String,
    /// Signed 64-bit integer.
    Int,
    /// Boolean.
    Bool,
    /// 64-bit floating point.
    Float,
    /// UTC timestamp.
    Timestamp,
}

impl DataType {
    /// All data types, in declaration order.
    pub const ALL: [DataType; 5] = [
        DataType::String,
        DataType::Int,
        DataType::Bool,
        DataType::Float,
        DataType::Timestamp,
    ];

    /// Returns the lowercase name used in schemas.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Int => "int",
            DataType::Bool => "bool",
            DataType::Float => "float",
            DataType::Timestamp => "timestamp",
        }
    }

    /// Returns true if `value` may be stored in a column of this type.
    ///
    /// `int` also accepts a float with no fractional part; `float` also
    /// accepts an integer. Every other type requires the exact variant.
    /// NaN and infinities are never accepted: snapshots cannot encode them.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        self.normalize(value.clone()).is_some()
    }

    /// Converts `value` to this type's canonical variant.
    ///
    /// Returns `None` if the value is not accepted by this type.
    #[must_use]
    pub fn normalize(self, value: Value) -> Option<Value> {
        match (self, value) {
            (DataType::String, v @ Value::String(_)) => Some(v),
            (DataType::Int, v @ Value::Int(_)) => Some(v),
            (DataType::Int, Value::Float(f)) => whole_number(f).map(Value::Int),
            (DataType::Bool, v @ Value::Bool(_)) => Some(v),
            (DataType::Float, Value::Float(f)) if f.is_finite() => Some(Value::Float(f)),
            #[allow(clippy::cast_precision_loss)]
            (DataType::Float, Value::Int(i)) => Some(Value::Float(i as f64)),
            (DataType::Timestamp, v @ Value::Timestamp(_)) => Some(v),
            _ => None,
        }
    }
}

/// Returns `f` as an `i64` if it is finite, integral and in range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_number(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown data type: {s} (expected string, int, bool, float or timestamp)")
            })
    }
}

/// A single cell value.
///
/// Equality is exact: values of different variants are never equal, so
/// `Int(1)` does not equal `Float(1.0)`.
///
/// The serialized form is tagged (`{"type": "int", "value": 1}`) so a
/// snapshot reloads every value with its original variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// UTF-8 text.
    String(String),
    /// Signed 64-bit integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// 64-bit floating point.
    Float(f64),
    /// UTC timestamp.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns the data type this value naturally belongs to.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Value::String(_) => DataType::String,
            Value::Int(_) => DataType::Int,
            Value::Bool(_) => DataType::Bool,
            Value::Float(_) => DataType::Float,
            Value::Timestamp(_) => DataType::Timestamp,
        }
    }

    /// Returns false for a NaN or infinite float.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        !matches!(self, Value::Float(f) if !f.is_finite())
    }

    /// Returns the text if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an int value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean if this is a bool value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the float if this is a float value.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a timestamp value.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}
