//! Request handlers.
//!
//! Handlers translate JSON to core calls and back. Every database call runs
//! on the blocking pool: core operations take locks and write snapshots
//! synchronously.

use crate::error::{ServerError, ServerResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tabula_core::json::{row_from_json, row_to_json, rows_to_json};
use tabula_core::{
    coerce_to_schema, parse_where_clause, Column, Conditions, Database, Operation, Row,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
}

impl AppState {
    /// Creates handler state over `db`.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Returns the served database.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    async fn blocking<T, F>(&self, f: F) -> ServerResult<T>
    where
        F: FnOnce(&Database) -> ServerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| ServerError::Internal(format!("database task failed: {e}")))?
    }
}

/// Body of `POST /tables`.
#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    /// Table name.
    pub name: String,
    /// Column definitions.
    pub columns: Vec<Column>,
}

/// Response of `GET /tables/{name}`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    /// Table name.
    pub name: String,
    /// Declared columns.
    pub columns: Vec<Column>,
    /// Current number of rows.
    pub row_count: usize,
}

/// Query string accepted by row reads and deletes.
#[derive(Debug, Default, Deserialize)]
pub struct WhereQuery {
    /// A JSON object or `a=1 AND b=x` clause text.
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
}

/// Query string accepted by `GET /history`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Restrict to one table.
    pub table: Option<String>,
}

/// Body of `PUT /tables/{name}/rows`.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// Conditions as a JSON object or clause text. Absent matches all rows.
    #[serde(default, rename = "where")]
    pub where_clause: Option<JsonValue>,
    /// Column values to set.
    pub updates: JsonValue,
}

/// One history entry with rows rendered as plain JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationView {
    /// `insert`, `update` or `delete`.
    pub kind: String,
    /// Table the operation applied to.
    pub table_name: String,
    /// Row after the operation.
    pub new_data: JsonValue,
    /// Row before the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_data: Option<JsonValue>,
    /// When it was applied.
    pub timestamp: DateTime<Utc>,
}

impl From<&Operation> for OperationView {
    fn from(op: &Operation) -> Self {
        Self {
            kind: op.kind.to_string(),
            table_name: op.table_name.clone(),
            new_data: row_to_json(&op.new_data),
            old_data: op.old_data.as_ref().map(row_to_json),
            timestamp: op.timestamp,
        }
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::InvalidRequest(rejection.body_text()))
}

/// Turns `where` input into conditions typed for `columns`.
///
/// Text starting with `{` is read as a JSON object, anything else as a
/// clause. Blank input matches every row.
fn conditions_from_text(text: &str, columns: &[Column]) -> ServerResult<Conditions> {
    let text = text.trim();
    let conditions = if text.starts_with('{') {
        let json: JsonValue = serde_json::from_str(text)
            .map_err(|e| ServerError::InvalidRequest(format!("invalid where clause: {e}")))?;
        row_from_json(&json)?
    } else {
        parse_where_clause(text)?
    };
    Ok(coerce_to_schema(columns, conditions))
}

fn conditions_from_json(json: Option<&JsonValue>, columns: &[Column]) -> ServerResult<Conditions> {
    match json {
        None | Some(JsonValue::Null) => Ok(Conditions::new()),
        Some(JsonValue::String(text)) => conditions_from_text(text, columns),
        Some(json) => Ok(coerce_to_schema(columns, row_from_json(json)?)),
    }
}

fn row_for(json: &JsonValue, columns: &[Column]) -> ServerResult<Row> {
    Ok(coerce_to_schema(columns, row_from_json(json)?))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `POST /tables`
pub async fn create_table(
    State(state): State<AppState>,
    payload: Result<Json<CreateTableRequest>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let request = body(payload)?;
    state
        .blocking(move |db| Ok(db.create_table(&request.name, request.columns)?))
        .await?;
    Ok(StatusCode::CREATED)
}

/// `GET /tables`
pub async fn list_tables(State(state): State<AppState>) -> ServerResult<Json<Vec<String>>> {
    let names = state.blocking(|db| Ok(db.table_names())).await?;
    Ok(Json(names))
}

/// `GET /tables/{name}`
pub async fn describe_table(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Json<TableInfo>> {
    let info = state
        .blocking(move |db| {
            let table = db.table(&name)?;
            Ok(TableInfo {
                name: table.name().to_string(),
                columns: table.columns().to_vec(),
                row_count: table.len(),
            })
        })
        .await?;
    Ok(Json(info))
}

/// `POST /tables/{name}/rows`
pub async fn insert_row(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let json = body(payload)?;
    state
        .blocking(move |db| {
            let table = db.table(&name)?;
            let row = row_for(&json, table.columns())?;
            Ok(db.insert(&name, row)?)
        })
        .await?;
    Ok(StatusCode::CREATED)
}

/// `GET /tables/{name}/rows?where=...`
pub async fn select_rows(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<WhereQuery>,
) -> ServerResult<Json<JsonValue>> {
    let rows = state
        .blocking(move |db| {
            let table = db.table(&name)?;
            let conditions =
                conditions_from_text(query.where_clause.as_deref().unwrap_or(""), table.columns())?;
            Ok(db.select(&name, &conditions)?)
        })
        .await?;
    Ok(Json(rows_to_json(&rows)))
}

/// `PUT /tables/{name}/rows`
pub async fn update_rows(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ServerResult<Json<JsonValue>> {
    let request = body(payload)?;
    let updated = state
        .blocking(move |db| {
            let table = db.table(&name)?;
            let conditions = conditions_from_json(request.where_clause.as_ref(), table.columns())?;
            let updates = row_for(&request.updates, table.columns())?;
            Ok(db.update(&name, &conditions, updates)?)
        })
        .await?;
    Ok(Json(json!({ "updated": updated })))
}

/// `DELETE /tables/{name}/rows?where=...`
pub async fn delete_rows(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<WhereQuery>,
) -> ServerResult<Json<JsonValue>> {
    let deleted = state
        .blocking(move |db| {
            let table = db.table(&name)?;
            let conditions =
                conditions_from_text(query.where_clause.as_deref().unwrap_or(""), table.columns())?;
            Ok(db.delete(&name, &conditions)?)
        })
        .await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// `POST /rollback`
pub async fn rollback(State(state): State<AppState>) -> ServerResult<StatusCode> {
    state.blocking(|db| Ok(db.rollback()?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /history?table=...`
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ServerResult<Json<Vec<OperationView>>> {
    let ops = state
        .blocking(move |db| {
            Ok(match query.table {
                Some(table) => db.history_for(&table),
                None => db.history(),
            })
        })
        .await?;
    Ok(Json(ops.iter().map(OperationView::from).collect()))
}

/// `DELETE /history`
pub async fn clear_history(State(state): State<AppState>) -> ServerResult<StatusCode> {
    state.blocking(|db| Ok(db.clear_history()?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use tabula_core::DataType;

    fn state() -> AppState {
        AppState::new(Arc::new(Database::open_in_memory("test").unwrap()))
    }

    async fn with_users() -> AppState {
        let state = state();
        let request = CreateTableRequest {
            name: "users".into(),
            columns: vec![
                Column::new("id", DataType::Int),
                Column::new("name", DataType::String),
                Column::new("active", DataType::Bool),
            ],
        };
        let status = create_table(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        for row in [
            json!({"id": 1, "name": "A", "active": true}),
            json!({"id": 2, "name": "B", "active": false}),
        ] {
            insert_row(State(state.clone()), Path("users".into()), Ok(Json(row)))
                .await
                .unwrap();
        }
        state
    }

    fn where_query(text: &str) -> Query<WhereQuery> {
        Query(WhereQuery {
            where_clause: Some(text.to_string()),
        })
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn create_and_describe() {
        let state = with_users().await;

        let Json(names) = list_tables(State(state.clone())).await.unwrap();
        assert_eq!(names, vec!["users".to_string()]);

        let Json(info) = describe_table(State(state), Path("users".into()))
            .await
            .unwrap();
        assert_eq!(info.row_count, 2);
        assert_eq!(info.columns.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_table_is_conflict() {
        let state = with_users().await;
        let request = CreateTableRequest {
            name: "users".into(),
            columns: vec![Column::new("id", DataType::Int)],
        };
        let err = create_table(State(state), Ok(Json(request)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn select_with_json_and_clause_conditions() {
        let state = with_users().await;

        let Json(rows) = select_rows(
            State(state.clone()),
            Path("users".into()),
            where_query(r#"{"active": true}"#),
        )
        .await
        .unwrap();
        assert_eq!(rows, json!([{"id": 1, "name": "A", "active": true}]));

        let Json(rows) = select_rows(
            State(state.clone()),
            Path("users".into()),
            where_query("id=2 AND name=B"),
        )
        .await
        .unwrap();
        assert_eq!(rows, json!([{"id": 2, "name": "B", "active": false}]));

        let Json(rows) = select_rows(State(state), Path("users".into()), Query(WhereQuery::default()))
            .await
            .unwrap();
        assert_eq!(rows.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn malformed_clause_is_bad_request() {
        let state = with_users().await;
        let err = select_rows(State(state), Path("users".into()), where_query("id=1=2"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let state = state();
        let err = select_rows(State(state), Path("nope".into()), Query(WhereQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let json: JsonValue = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "table nope not found");
    }

    #[tokio::test]
    async fn invalid_row_is_bad_request() {
        let state = with_users().await;
        let err = insert_row(
            State(state.clone()),
            Path("users".into()),
            Ok(Json(json!({"id": "x", "name": "C", "active": true}))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = insert_row(State(state), Path("users".into()), Ok(Json(json!([1, 2]))))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_and_delete() {
        let state = with_users().await;

        let request = UpdateRequest {
            where_clause: Some(json!({"id": 2})),
            updates: json!({"active": true}),
        };
        let Json(result) = update_rows(State(state.clone()), Path("users".into()), Ok(Json(request)))
            .await
            .unwrap();
        assert_eq!(result, json!({"updated": 1}));

        let request = UpdateRequest {
            where_clause: Some(json!("name=A")),
            updates: json!({"age": 3}),
        };
        let err = update_rows(State(state.clone()), Path("users".into()), Ok(Json(request)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(result) = delete_rows(State(state.clone()), Path("users".into()), where_query("id=1"))
            .await
            .unwrap();
        assert_eq!(result, json!({"deleted": 1}));
        assert_eq!(state.db().table("users").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inserts_survive_reopen_of_the_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let open = || AppState::new(Arc::new(Database::open("MyDB", dir.path()).unwrap()));

        {
            let state = open();
            let request = CreateTableRequest {
                name: "events".into(),
                columns: vec![
                    Column::new("id", DataType::Int),
                    Column::new("at", DataType::Timestamp),
                ],
            };
            create_table(State(state.clone()), Ok(Json(request)))
                .await
                .unwrap();
            insert_row(
                State(state),
                Path("events".into()),
                Ok(Json(json!({"id": 1, "at": "2024-05-01T12:00:00Z"}))),
            )
            .await
            .unwrap();
        }

        let state = open();
        let Json(rows) = select_rows(
            State(state),
            Path("events".into()),
            where_query("at=2024-05-01T12:00:00Z"),
        )
        .await
        .unwrap();
        assert_eq!(rows, json!([{"id": 1, "at": "2024-05-01T12:00:00+00:00"}]));
    }

    #[tokio::test]
    async fn rollback_and_history() {
        let state = with_users().await;

        let Json(history) = list_history(State(state.clone()), Query(HistoryQuery::default()))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].kind, "insert");
        assert_eq!(history[1].new_data["name"], "B");

        let status = rollback(State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.db().table("users").unwrap().len(), 1);

        clear_history(State(state.clone())).await.unwrap();
        let err = rollback(State(state)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
