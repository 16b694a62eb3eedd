//! Property-based test generators using proptest.
//!
//! Provides strategies for generating schemas and rows that satisfy them,
//! plus loosely typed values for exercising validation.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use std::collections::BTreeSet;
use tabula_core::{Column, DataType, Row, Value};

/// Strategy for generating data types.
pub fn data_type_strategy() -> impl Strategy<Value = DataType> {
    prop::sample::select(DataType::ALL.to_vec())
}

/// Strategy for generating valid table and column names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating timestamps with whole-second precision.
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // 1970-01-01 through 2099-12-31
    (0i64..4_102_444_800).prop_filter_map("timestamp out of range", |secs| {
        DateTime::from_timestamp(secs, 0)
    })
}

/// Strategy for generating a value of `data_type`'s canonical variant.
///
/// Floats are finite multiples of 1/4 so that they compare equal to
/// themselves and survive a text round trip exactly.
pub fn value_strategy(data_type: DataType) -> BoxedStrategy<Value> {
    match data_type {
        DataType::String => prop::string::string_regex("[a-zA-Z0-9 ]{0,12}")
            .expect("Invalid regex")
            .prop_map(Value::String)
            .boxed(),
        DataType::Int => any::<i64>().prop_map(Value::Int).boxed(),
        DataType::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        DataType::Float => (-4_000_000i32..4_000_000)
            .prop_map(|quarters| Value::Float(f64::from(quarters) / 4.0))
            .boxed(),
        DataType::Timestamp => timestamp_strategy().prop_map(Value::Timestamp).boxed(),
    }
}

/// Strategy for generating a value of any type.
pub fn any_value_strategy() -> impl Strategy<Value = Value> {
    data_type_strategy().prop_flat_map(value_strategy)
}

/// Strategy for generating a schema of 1 to `max_columns` uniquely named columns.
pub fn schema_strategy(max_columns: usize) -> impl Strategy<Value = Vec<Column>> {
    prop::collection::btree_set(name_strategy(), 1..=max_columns.max(1)).prop_flat_map(
        |names: BTreeSet<String>| {
            let count = names.len();
            prop::collection::vec(data_type_strategy(), count).prop_map(move |types| {
                names
                    .iter()
                    .zip(types)
                    .map(|(name, data_type)| Column::new(name.clone(), data_type))
                    .collect::<Vec<_>>()
            })
        },
    )
}

/// Strategy for generating a row that satisfies `columns`.
pub fn row_strategy(columns: &[Column]) -> BoxedStrategy<Row> {
    let cells: Vec<BoxedStrategy<(String, Value)>> = columns
        .iter()
        .map(|column| {
            let name = column.name.clone();
            value_strategy(column.data_type)
                .prop_map(move |value| (name.clone(), value))
                .boxed()
        })
        .collect();
    cells
        .prop_map(|cells| cells.into_iter().collect::<Row>())
        .boxed()
}

/// Strategy for generating a schema together with up to `max_rows` valid rows.
pub fn table_strategy(
    max_columns: usize,
    max_rows: usize,
) -> impl Strategy<Value = (Vec<Column>, Vec<Row>)> {
    schema_strategy(max_columns).prop_flat_map(move |columns| {
        let rows = prop::collection::vec(row_strategy(&columns), 0..=max_rows);
        (Just(columns), rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn values_match_their_type(
            (data_type, value) in data_type_strategy().prop_flat_map(|t| (Just(t), value_strategy(t)))
        ) {
            prop_assert_eq!(value.data_type(), data_type);
            prop_assert!(data_type.accepts(&value));
        }

        #[test]
        fn schemas_have_unique_names(columns in schema_strategy(6)) {
            let names: BTreeSet<_> = columns.iter().map(|c| c.name.clone()).collect();
            prop_assert_eq!(names.len(), columns.len());
            prop_assert!(!columns.is_empty());
        }

        #[test]
        fn rows_satisfy_schema((columns, rows) in table_strategy(4, 8)) {
            for row in &rows {
                prop_assert_eq!(row.len(), columns.len());
                for column in &columns {
                    let value = &row[&column.name];
                    prop_assert!(column.data_type.accepts(value));
                }
            }
        }
    }
}
