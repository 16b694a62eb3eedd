//! Router construction and the listener loop.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{self, AppState};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tabula_core::Database;
use tokio::net::TcpListener;
use tracing::info;

/// Builds the HTTP routes over `db`.
///
/// | Method | Path | Action |
/// |---|---|---|
/// | `GET` | `/health` | liveness |
/// | `GET`, `POST` | `/tables` | list / create tables |
/// | `GET` | `/tables/:name` | schema and row count |
/// | `GET`, `POST`, `PUT`, `DELETE` | `/tables/:name/rows` | select / insert / update / delete |
/// | `POST` | `/rollback` | undo the latest operation |
/// | `GET`, `DELETE` | `/history` | list / clear the history |
pub fn router(db: Arc<Database>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handler::health))
        .route(
            "/tables",
            get(handler::list_tables).post(handler::create_table),
        )
        .route("/tables/:name", get(handler::describe_table))
        .route(
            "/tables/:name/rows",
            get(handler::select_rows)
                .post(handler::insert_row)
                .put(handler::update_rows)
                .delete(handler::delete_rows),
        )
        .route("/rollback", post(handler::rollback))
        .route(
            "/history",
            get(handler::list_history).delete(handler::clear_history),
        )
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(AppState::new(db))
}

/// Serves `db` on an already bound listener until `shutdown` completes.
///
/// # Errors
///
/// Returns an I/O error if the listener fails.
pub async fn serve<F>(
    listener: TcpListener,
    db: Arc<Database>,
    config: &ServerConfig,
    shutdown: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(db, config);
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server stopped");
    Ok(())
}

/// Opens the configured database, binds and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the address
/// cannot be bound.
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let db = Database::open(config.database_name.clone(), &config.data_dir)?;
    let listener = TcpListener::bind(config.bind_addr).await?;
    serve(listener, Arc::new(db), &config, shutdown_signal()).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler, run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
