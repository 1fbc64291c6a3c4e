//! Error types for codelang.
//!
//! All fallible operations in the crate return [`Result`], whose error type is
//! [`CodelangError`]. Errors that can occur while training are kept separate from
//! errors that can occur while loading a persisted model so that callers can tell a
//! bad corpus from a corrupted model file.
//!
//! # Examples
//!
//! ```
//! use codelang::error::{CodelangError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(CodelangError::invalid_config("tradeoff must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for codelang operations.
#[derive(Error, Debug)]
pub enum CodelangError {
    /// I/O errors (reading corpora, reading or writing model files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted model is structurally invalid
    #[error("Decode error: {0}")]
    Decode(String),

    /// The requested algorithm is not registered
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Invalid training parameters or model configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Training could not produce a classifier
    #[error("Training error: {0}")]
    Training(String),

    /// Invalid operation for the given classifier
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type alias for operations that may fail with CodelangError.
pub type Result<T> = std::result::Result<T, CodelangError>;

impl CodelangError {
    /// Create a new decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        CodelangError::Decode(msg.into())
    }

    /// Create a new unknown algorithm error.
    pub fn unknown_algorithm<S: Into<String>>(name: S) -> Self {
        CodelangError::UnknownAlgorithm(name.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        CodelangError::InvalidConfig(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        CodelangError::Training(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        CodelangError::InvalidOperation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = CodelangError::decode("missing field");
        assert_eq!(error.to_string(), "Decode error: missing field");

        let error = CodelangError::unknown_algorithm("forest");
        assert_eq!(error.to_string(), "Unknown algorithm: forest");

        let error = CodelangError::invalid_config("bad kernel");
        assert_eq!(error.to_string(), "Invalid configuration: bad kernel");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = CodelangError::from(io_error);

        match error {
            CodelangError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
