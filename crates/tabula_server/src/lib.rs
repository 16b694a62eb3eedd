//! # Tabula Server
//!
//! HTTP front end for a Tabula database.
//!
//! This crate provides:
//! - JSON endpoints for table creation and row insert, select, update, delete
//! - Rollback and history endpoints
//! - Mapping from core errors to HTTP status codes
//!
//! Rows travel as plain JSON objects. Conditions arrive either as a JSON
//! object or as clause text (`id=1 AND active=true`) in the `where` query
//! parameter. Errors are returned as `{"error": "<message>"}`.
//!
//! | Error | Status |
//! |---|---|
//! | table not found | 404 |
//! | validation, unknown column, parse, malformed body | 400 |
//! | table exists, no history, rollback row gone | 409 |
//! | persistence, unknown operation, internal | 500 |
//!
//! # Example
//!
//! ```rust,no_run
//! use tabula_server::{run, ServerConfig};
//!
//! # async fn start() -> tabula_server::ServerResult<()> {
//! let config = ServerConfig::default()
//!     .with_data_dir("./data")
//!     .with_database_name("MyDB");
//! run(config).await
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod server;

pub use config::{ServerConfig, DEFAULT_MAX_BODY_BYTES};
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::{router, run, serve};
