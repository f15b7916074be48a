//! Error types for csvserve
//!
//! Each stage of the pipeline has its own domain error (see [`domain`]); the
//! crate-level [`CsvServeError`] wraps them so startup code can propagate any
//! failure with `?` and let `main` decide how to exit.

use thiserror::Error;

mod domain;

pub use domain::{ImportError, QueryError, SchemaError};

/// Result type alias for csvserve operations
pub type Result<T> = std::result::Result<T, CsvServeError>;

/// Main error type for csvserve
#[derive(Error, Debug)]
pub enum CsvServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl CsvServeError {
    /// Create a store error with operation context
    ///
    /// # Example
    /// ```ignore
    /// CsvServeError::store("open", "out of memory")
    /// // produces: "Store error: open: out of memory"
    /// ```
    pub fn store(operation: &str, detail: impl std::fmt::Display) -> Self {
        CsvServeError::Store(format!("{}: {}", operation, detail))
    }

    /// Create a server error with operation context
    pub fn server(operation: &str, detail: impl std::fmt::Display) -> Self {
        CsvServeError::Server(format!("{}: {}", operation, detail))
    }

    /// Whether the failure happened before the query surface came up.
    ///
    /// Used by the binary to pick the log message; every error returned from
    /// startup is fatal either way.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            CsvServeError::Config(_)
                | CsvServeError::Io(_)
                | CsvServeError::Schema(_)
                | CsvServeError::Import(_)
                | CsvServeError::Store(_)
        )
    }
}
