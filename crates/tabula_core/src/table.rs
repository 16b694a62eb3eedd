//! Tables: a fixed schema and an ordered row set.

use crate::condition::{match_conditions, Conditions};
use crate::error::{CoreError, CoreResult};
use crate::history::{History, Operation};
use crate::schema::{validate_definition, Column, Row};
use crate::snapshot::TableSnapshot;
use crate::value::Value;
use parking_lot::RwLock;
use tracing::debug;

/// A named relation with a fixed schema.
///
/// Every stored row holds a value of the declared type for every column.
/// Rows keep insertion order; update and delete preserve the relative order
/// of the remaining rows.
///
/// Mutations take the row set's write lock and append their history entries
/// before releasing it, so entries for one table are recorded in the order
/// the mutations were applied. Selects share the read lock.
///
/// Tables are created and mutated through [`crate::Database`]; handles
/// returned by [`crate::Database::table`] are read-only.
#[derive(Debug)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: RwLock<Vec<Row>>,
}

impl Table {
    /// Creates an empty table after checking its definition.
    pub(crate) fn new(name: impl Into<String>, columns: Vec<Column>) -> CoreResult<Self> {
        let name = name.into();
        validate_definition(&name, &columns)?;
        Ok(Self {
            name,
            columns,
            rows: RwLock::new(Vec::new()),
        })
    }

    /// Rebuilds a table from a snapshot, validating every row.
    pub(crate) fn from_snapshot(snapshot: TableSnapshot) -> CoreResult<Self> {
        let table = Self::new(snapshot.name, snapshot.columns)?;
        let rows = snapshot
            .rows
            .into_iter()
            .map(|row| table.validate_row(row))
            .collect::<CoreResult<Vec<_>>>()?;
        *table.rows.write() = rows;
        Ok(table)
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared columns, in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column named `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Returns a copy of every row, in table order.
    #[must_use]
    pub fn rows(&self) -> Vec<Row> {
        self.rows.read().clone()
    }

    /// Returns copies of the rows matching `conditions`, in table order.
    ///
    /// Empty conditions return every row. Matching is exact; see
    /// [`match_conditions`].
    #[must_use]
    pub fn select(&self, conditions: &Conditions) -> Vec<Row> {
        let rows = self.rows.read();
        let selected: Vec<Row> = rows
            .iter()
            .filter(|row| match_conditions(row, conditions))
            .cloned()
            .collect();
        debug!(
            table = %self.name,
            scanned = rows.len(),
            matched = selected.len(),
            "select"
        );
        selected
    }

    /// Checks `row` against the schema and normalizes its values.
    ///
    /// Every declared column must be present with an accepted value.
    /// Accepted values are converted to the column's canonical variant.
    /// Keys the schema does not declare are kept as they are, provided they
    /// hold no NaN or infinite float.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for a missing column, a value of
    /// the wrong type, or a non-finite float anywhere in the row.
    pub fn validate_row(&self, mut row: Row) -> CoreResult<Row> {
        if let Some((key, _)) = row.iter().find(|(_, value)| !value.is_finite()) {
            return Err(CoreError::validation(format!(
                "column {key} in table {} holds a non-finite float",
                self.name
            )));
        }

        for column in &self.columns {
            let value = row.remove(&column.name).ok_or_else(|| {
                CoreError::validation(format!(
                    "missing column {} in table {}",
                    column.name, self.name
                ))
            })?;
            let value = self.normalize(column, value)?;
            row.insert(column.name.clone(), value);
        }
        Ok(row)
    }

    /// Checks a single value destined for `column` and normalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownColumn`] if the table does not declare
    /// `column`, or [`CoreError::Validation`] if the type does not match.
    pub fn validate_value(&self, column: &str, value: Value) -> CoreResult<Value> {
        let declared = self
            .column(column)
            .ok_or_else(|| CoreError::unknown_column(&self.name, column))?;
        self.normalize(declared, value)
    }

    fn normalize(&self, column: &Column, value: Value) -> CoreResult<Value> {
        if !value.is_finite() {
            return Err(CoreError::validation(format!(
                "column {} in table {} holds a non-finite float",
                column.name, self.name
            )));
        }
        let found = value.data_type();
        column.data_type.normalize(value).ok_or_else(|| {
            CoreError::validation(format!(
                "column {} in table {} expects {}, got {}",
                column.name, self.name, column.data_type, found
            ))
        })
    }

    /// Validates and appends `row`, recording an insert.
    pub(crate) fn insert(&self, row: Row, history: &History) -> CoreResult<()> {
        let row = self.validate_row(row)?;

        let mut rows = self.rows.write();
        rows.push(row.clone());
        history.append(Operation::insert(&self.name, row));
        debug!(table = %self.name, rows = rows.len(), "inserted row");
        Ok(())
    }

    /// Overlays `updates` on every row matching `conditions`.
    ///
    /// All updates are validated before any row is touched, so a bad key or
    /// value fails the call without effect, whether or not rows match. Each
    /// changed row records one update with its pre- and post-image.
    pub(crate) fn update(
        &self,
        conditions: &Conditions,
        updates: Row,
        history: &History,
    ) -> CoreResult<usize> {
        let updates = updates
            .into_iter()
            .map(|(column, value)| {
                let value = self.validate_value(&column, value)?;
                Ok((column, value))
            })
            .collect::<CoreResult<Row>>()?;

        let mut rows = self.rows.write();
        let mut updated = 0;
        for row in rows.iter_mut().filter(|row| match_conditions(row, conditions)) {
            let old = row.clone();
            row.extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));
            history.append(Operation::update(&self.name, old, row.clone()));
            updated += 1;
        }

        debug!(table = %self.name, updated, "updated rows");
        Ok(updated)
    }

    /// Removes every row matching `conditions`, recording one delete per row.
    pub(crate) fn delete(&self, conditions: &Conditions, history: &History) -> usize {
        let mut rows = self.rows.write();
        let (removed, kept): (Vec<Row>, Vec<Row>) = std::mem::take(&mut *rows)
            .into_iter()
            .partition(|row| match_conditions(row, conditions));
        *rows = kept;

        let deleted = removed.len();
        for row in removed {
            history.append(Operation::delete(&self.name, row));
        }

        debug!(table = %self.name, deleted, remaining = rows.len(), "deleted rows");
        deleted
    }

    /// Undoes an insert by removing the latest row equal to `new_data`.
    pub(crate) fn rollback_insert(&self, new_data: &Row) -> CoreResult<()> {
        let mut rows = self.rows.write();
        let index = rows
            .iter()
            .rposition(|row| row == new_data)
            .ok_or_else(|| CoreError::row_not_found(&self.name))?;
        rows.remove(index);
        Ok(())
    }

    /// Undoes an update by restoring `old_data` over the row equal to `new_data`.
    pub(crate) fn rollback_update(&self, new_data: &Row, old_data: &Row) -> CoreResult<()> {
        let mut rows = self.rows.write();
        let row = rows
            .iter_mut()
            .rev()
            .find(|row| *row == new_data)
            .ok_or_else(|| CoreError::row_not_found(&self.name))?;
        *row = old_data.clone();
        Ok(())
    }

    /// Undoes a delete by appending `old_data`. The original position is lost.
    pub(crate) fn rollback_delete(&self, old_data: Row) {
        self.rows.write().push(old_data);
    }

    /// Captures the schema and rows for persistence.
    pub(crate) fn to_snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self.rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::OperationKind;
    use crate::row;
    use crate::value::DataType;

    fn users() -> Table {
        Table::new(
            "users",
            vec![
                Column::new("id", DataType::Int),
                Column::new("name", DataType::String),
                Column::new("active", DataType::Bool),
            ],
        )
        .unwrap()
    }

    fn seeded() -> (Table, History) {
        let table = users();
        let history = History::new();
        table
            .insert(row! { "id" => 1, "name" => "A", "active" => true }, &history)
            .unwrap();
        table
            .insert(row! { "id" => 2, "name" => "B", "active" => false }, &history)
            .unwrap();
        table
            .insert(row! { "id" => 3, "name" => "C", "active" => true }, &history)
            .unwrap();
        (table, history)
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().filter_map(|r| r["id"].as_int()).collect()
    }

    #[test]
    fn insert_and_select_all() {
        let (table, history) = seeded();
        assert_eq!(table.len(), 3);
        assert_eq!(ids(&table.select(&Conditions::new())), vec![1, 2, 3]);
        assert_eq!(history.len(), 3);
        assert!(history
            .operations()
            .iter()
            .all(|op| op.kind == OperationKind::Insert && op.old_data.is_none()));
    }

    #[test]
    fn insert_missing_column_fails() {
        let (table, history) = seeded();
        let result = table.insert(row! { "id" => 4, "name" => "D" }, &history);
        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(table.len(), 3);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn insert_wrong_type_fails() {
        let (table, history) = seeded();
        let result = table.insert(
            row! { "id" => "4", "name" => "D", "active" => true },
            &history,
        );
        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn insert_normalizes_whole_float_for_int_column() {
        let table = users();
        let history = History::new();
        table
            .insert(row! { "id" => 7.0, "name" => "G", "active" => true }, &history)
            .unwrap();

        assert_eq!(table.rows()[0]["id"], Value::Int(7));
        assert_eq!(table.select(&row! { "id" => 7 }).len(), 1);
        assert_eq!(history.last().unwrap().new_data["id"], Value::Int(7));
    }

    #[test]
    fn insert_rejects_fractional_float_for_int_column() {
        let table = users();
        let result = table.insert(
            row! { "id" => 7.5, "name" => "G", "active" => true },
            &History::new(),
        );
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn insert_rejects_non_finite_floats() {
        let table = Table::new("m", vec![Column::new("x", DataType::Float)]).unwrap();
        let history = History::new();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = table.insert(row! { "x" => bad }, &history);
            assert!(matches!(result, Err(CoreError::Validation { .. })), "{bad}");

            let result = table.insert(row! { "x" => 1.0, "extra" => bad }, &history);
            assert!(matches!(result, Err(CoreError::Validation { .. })), "{bad}");
        }
        assert!(table.is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn update_rejects_non_finite_floats() {
        let table = Table::new("m", vec![Column::new("x", DataType::Float)]).unwrap();
        let history = History::new();
        table.insert(row! { "x" => 1.0 }, &history).unwrap();

        let result = table.update(&Conditions::new(), row! { "x" => f64::NAN }, &history);
        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(table.rows(), vec![row! { "x" => 1.0 }]);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn insert_keeps_undeclared_keys() {
        let table = users();
        table
            .insert(
                row! { "id" => 1, "name" => "A", "active" => true, "note" => "x" },
                &History::new(),
            )
            .unwrap();
        assert_eq!(table.rows()[0]["note"], Value::from("x"));
    }

    #[test]
    fn select_filters_exactly() {
        let (table, _) = seeded();
        assert_eq!(ids(&table.select(&row! { "active" => true })), vec![1, 3]);
        assert!(table.select(&row! { "active" => "true" }).is_empty());
        assert!(table.select(&row! { "missing" => 1 }).is_empty());
    }

    #[test]
    fn update_matching_rows() {
        let (table, history) = seeded();
        let updated = table
            .update(&row! { "active" => true }, row! { "name" => "Z" }, &history)
            .unwrap();

        assert_eq!(updated, 2);
        let rows = table.rows();
        assert_eq!(rows[0]["name"], Value::from("Z"));
        assert_eq!(rows[1]["name"], Value::from("B"));
        assert_eq!(rows[2]["name"], Value::from("Z"));
        assert_eq!(rows[0]["active"], Value::Bool(true));

        let ops = history.operations();
        assert_eq!(ops.len(), 5);
        let last = &ops[4];
        assert_eq!(last.kind, OperationKind::Update);
        assert_eq!(last.old_data.as_ref().unwrap()["name"], Value::from("C"));
        assert_eq!(last.new_data["name"], Value::from("Z"));
    }

    #[test]
    fn update_unknown_column_fails_without_effect() {
        let (table, history) = seeded();
        let before = table.rows();

        let result = table.update(
            &Conditions::new(),
            row! { "name" => "Z", "age" => 3 },
            &history,
        );

        assert!(matches!(result, Err(CoreError::UnknownColumn { .. })));
        assert_eq!(table.rows(), before);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn update_validates_even_when_nothing_matches() {
        let (table, history) = seeded();
        let result = table.update(&row! { "id" => 99 }, row! { "active" => 1 }, &history);
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn update_without_matches_returns_zero() {
        let (table, history) = seeded();
        let updated = table
            .update(&row! { "id" => 99 }, row! { "active" => true }, &history)
            .unwrap();
        assert_eq!(updated, 0);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn delete_preserves_remaining_order() {
        let (table, history) = seeded();
        let deleted = table.delete(&row! { "id" => 2 }, &history);

        assert_eq!(deleted, 1);
        assert_eq!(ids(&table.rows()), vec![1, 3]);

        let last = history.last().unwrap();
        assert_eq!(last.kind, OperationKind::Delete);
        assert_eq!(last.old_data.unwrap()["id"], Value::Int(2));
    }

    #[test]
    fn delete_records_one_entry_per_row() {
        let (table, history) = seeded();
        let deleted = table.delete(&row! { "active" => true }, &history);

        assert_eq!(deleted, 2);
        assert_eq!(history.len(), 5);
        assert_eq!(ids(&table.rows()), vec![2]);
    }

    #[test]
    fn delete_all_with_empty_conditions() {
        let (table, history) = seeded();
        assert_eq!(table.delete(&Conditions::new(), &history), 3);
        assert!(table.is_empty());
    }

    #[test]
    fn rollback_insert_removes_latest_equal_row() {
        let (table, history) = seeded();
        let op = history.last().unwrap();
        table.rollback_insert(&op.new_data).unwrap();
        assert_eq!(ids(&table.rows()), vec![1, 2]);
    }

    #[test]
    fn rollback_insert_of_missing_row_fails() {
        let (table, _) = seeded();
        let result = table.rollback_insert(&row! { "id" => 42 });
        assert!(matches!(result, Err(CoreError::RowNotFound { .. })));
    }

    #[test]
    fn rollback_update_restores_pre_image() {
        let (table, history) = seeded();
        table
            .update(&row! { "id" => 2 }, row! { "active" => true }, &history)
            .unwrap();

        let op = history.last().unwrap();
        table
            .rollback_update(&op.new_data, op.old_data.as_ref().unwrap())
            .unwrap();
        assert_eq!(table.rows()[1]["active"], Value::Bool(false));
    }

    #[test]
    fn rollback_update_after_further_change_fails() {
        let (table, history) = seeded();
        table
            .update(&row! { "id" => 2 }, row! { "active" => true }, &history)
            .unwrap();
        let op = history.last().unwrap();
        table
            .update(&row! { "id" => 2 }, row! { "name" => "X" }, &history)
            .unwrap();

        let result = table.rollback_update(&op.new_data, op.old_data.as_ref().unwrap());
        assert!(matches!(result, Err(CoreError::RowNotFound { .. })));
    }

    #[test]
    fn rollback_delete_appends() {
        let (table, history) = seeded();
        table.delete(&row! { "id" => 1 }, &history);
        let op = history.last().unwrap();

        table.rollback_delete(op.old_data.unwrap());
        assert_eq!(ids(&table.rows()), vec![2, 3, 1]);
    }

    #[test]
    fn snapshot_round_trip() {
        let (table, _) = seeded();
        let restored = Table::from_snapshot(table.to_snapshot()).unwrap();
        assert_eq!(restored.name(), "users");
        assert_eq!(restored.columns(), table.columns());
        assert_eq!(restored.rows(), table.rows());
    }

    #[test]
    fn snapshot_with_invalid_row_rejected() {
        let mut snapshot = users().to_snapshot();
        snapshot.rows.push(row! { "id" => 1 });
        assert!(Table::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn validate_value_checks_column_and_type() {
        let table = users();
        assert_eq!(table.validate_value("id", Value::Float(2.0)).unwrap(), Value::Int(2));
        assert!(matches!(
            table.validate_value("age", Value::Int(2)),
            Err(CoreError::UnknownColumn { .. })
        ));
        assert!(matches!(
            table.validate_value("active", Value::Int(2)),
            Err(CoreError::Validation { .. })
        ));
    }
}
