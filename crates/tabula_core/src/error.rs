//! Error types for Tabula core.

use tabula_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Tabula core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A row or value does not satisfy the table schema.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the mismatch.
        message: String,
    },

    /// An update named a column the table does not declare.
    #[error("column {column} does not exist in table {table}")]
    UnknownColumn {
        /// The table being updated.
        table: String,
        /// The undeclared column.
        column: String,
    },

    /// A table with this name is already registered.
    #[error("table {name} already exists")]
    TableExists {
        /// Name of the table.
        name: String,
    },

    /// No table with this name is registered.
    #[error("table {name} not found")]
    TableNotFound {
        /// Name of the table.
        name: String,
    },

    /// The row a rollback needs to restore is gone.
    #[error("row not found for rollback in table {table}")]
    RowNotFound {
        /// The table searched.
        table: String,
    },

    /// Rollback was requested with an empty history.
    #[error("no operations to rollback")]
    NoHistory,

    /// The history tail has a kind this engine does not know how to undo.
    #[error("unknown operation type: {kind}")]
    UnknownOperation {
        /// The unrecognized kind.
        kind: String,
    },

    /// A `WHERE` clause could not be parsed.
    #[error("invalid condition: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// The snapshot could not be written or read.
    ///
    /// When returned from a mutating call the in-memory change has already
    /// been applied; only its durability is uncertain.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an unknown column error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a table exists error.
    pub fn table_exists(name: impl Into<String>) -> Self {
        Self::TableExists { name: name.into() }
    }

    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    /// Creates a row not found error.
    pub fn row_not_found(table: impl Into<String>) -> Self {
        Self::RowNotFound {
            table: table.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Returns true if the error names something that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::TableNotFound { .. })
    }

    /// Returns true if the request conflicts with current state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::TableExists { .. } | CoreError::NoHistory | CoreError::RowNotFound { .. }
        )
    }

    /// Returns true if the caller sent bad input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation { .. } | CoreError::UnknownColumn { .. } | CoreError::Parse { .. }
        ) || self.is_not_found()
            || self.is_conflict()
    }

    /// Returns true if the failure is internal to the store.
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}
