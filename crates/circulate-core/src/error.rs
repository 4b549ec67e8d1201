//! Error types for Circulate core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages.

use thiserror::Error;

/// Result type alias for Circulate operations.
pub type Result<T> = std::result::Result<T, CirculateError>;

/// Core error type for Circulate operations.
#[derive(Debug, Error)]
pub enum CirculateError {
    /// Invalid user input (malformed patron id, bad book fields)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Resource not found (book, loan)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Corrupt stored data (unparsable timestamps)
    #[error("Corrupt data: {0}")]
    Data(String),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for CirculateError {
    fn from(err: rusqlite::Error) -> Self {
        CirculateError::Storage(err.to_string())
    }
}
