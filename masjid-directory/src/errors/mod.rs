//! Error types for the masjid directory binary.

use masjid_directory_repository::MasjidRepositoryError;
use thiserror::Error;

/// Errors that can occur during startup or while producing a report.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from the directory service or its store.
    #[error("Repository error: {0}")]
    RepositoryError(#[from] MasjidRepositoryError),

    /// The requested entry does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error writing report output.
    #[error("Output error: {0}")]
    OutputError(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::OutputError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::OutputError(err.to_string())
    }
}
