//! Error types for the record store and migration runner.

use jobtracker_core::{ColumnError, ValidationError};
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur while storing or migrating job applications.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A sort key or update key is not an allowed column.
    #[error(transparent)]
    InvalidColumn(#[from] ColumnError),

    /// Input rejected before any statement ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// SQLite database operation failure.
    #[error("database error: {0}")]
    Storage(#[source] rusqlite::Error),

    /// The command deadline passed and SQLite interrupted the statement.
    #[error("database operation timed out")]
    Timeout,

    /// A stored value could not be turned into a record.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// A migration script failed and was rolled back.
    #[error("migration {version} failed: {source}")]
    Migration {
        version: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Two migration scripts share a name.
    #[error("duplicate migration script: {0}")]
    DuplicateMigration(String),

    /// Filesystem failure while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if is_interrupted(&err) {
            StoreError::Timeout
        } else {
            StoreError::Storage(err)
        }
    }
}

pub(crate) fn is_interrupted(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
