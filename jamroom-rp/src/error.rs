//! Error types for jamroom-rp
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for jamroom-rp
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Song resolution found nothing or the resolver was unreachable
    #[error("Resolution failure: {0}")]
    Resolution(String),

    /// Audio transport could not connect or stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// Operation rejected by a state-machine or queue precondition
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using jamroom-rp Error
pub type Result<T> = std::result::Result<T, Error>;
