//! Error types for Move Playground

use thiserror::Error;

/// Result type alias using Move Playground's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Move Playground
///
/// Sandbox runs never surface through this type: a failed compile, a timeout or a
/// missing toolchain are reported as [`crate::sandbox::RunOutcome`] values. This enum
/// covers the configuration and persistence layers around the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Sandbox setup error (workspace or project skeleton)
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Database(_))
    }

    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::NotFound(_))
    }
}
