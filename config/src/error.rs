//! Error types for configuration handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating, reading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither the environment nor a config file provides a database.
    #[error(
        "no connection configuration found at {}; run `jobtracker configure` first or set JOBTRACKER_DB",
        .path.display()
    )]
    Missing { path: PathBuf },

    /// No home/config directory could be determined for the current user.
    #[error("cannot determine the user configuration directory; set JOBTRACKER_CONFIG")]
    NoConfigDir,

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidValue(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
