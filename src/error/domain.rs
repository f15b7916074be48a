//! Domain-specific error types for csvserve

use thiserror::Error;

/// Failures while resolving the table schema from the header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("could not open CSV file at {path}: {detail}")]
    Open { path: String, detail: String },

    #[error("could not read header: {0}")]
    HeaderRead(String),

    #[error("no header available: the file has no header line and no custom header was given")]
    MissingHeader,

    #[error("field count {field_count} exceeds the {header_len} header columns")]
    HeaderTooShort {
        field_count: usize,
        header_len: usize,
    },

    #[error("field count must be positive")]
    ZeroFieldCount,

    #[error("column {position} ({raw:?}) has no alphanumeric characters")]
    EmptyColumnName { position: usize, raw: String },

    #[error("duplicate column {name:?} (from {first:?} and {second:?})")]
    DuplicateColumn {
        name: String,
        first: String,
        second: String,
    },

    #[error("cannot index unknown column {0:?}")]
    UnknownIndexColumn(String),

    #[error("{statement}: {detail}")]
    Ddl { statement: String, detail: String },
}

impl SchemaError {
    pub fn ddl(statement: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Ddl {
            statement: statement.into(),
            detail: detail.to_string(),
        }
    }
}

/// Failures while loading data rows into the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("row arity mismatch at line {line}: expected {expected} fields, found {found}")]
    RowArity {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("could not read row{}: {detail}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Read { line: Option<u64>, detail: String },

    #[error("could not insert row at line {line}: {detail}")]
    Insert { line: u64, detail: String },

    #[error("import transaction failed: {0}")]
    Transaction(String),
}

/// Failures while answering a single request.
///
/// None of these are fatal to the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("no filter given: at least one column=value query parameter is required")]
    EmptyFilter,

    #[error("no such column: {0}")]
    UnknownColumn(String),

    #[error("{0}")]
    Execution(String),

    #[error("could not read row: {0}")]
    Decode(String),
}

impl QueryError {
    /// Whether the client caused the failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QueryError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_with_and_without_line() {
        let err = ImportError::Read {
            line: Some(7),
            detail: "invalid utf-8".to_string(),
        };
        assert_eq!(err.to_string(), "could not read row at line 7: invalid utf-8");

        let err = ImportError::Read {
            line: None,
            detail: "broken pipe".to_string(),
        };
        assert_eq!(err.to_string(), "could not read row: broken pipe");
    }

    #[test]
    fn test_query_error_classification() {
        assert!(QueryError::EmptyFilter.is_client_error());
        assert!(QueryError::UnknownColumn("x".into()).is_client_error());
        assert!(QueryError::Execution("syntax".into()).is_client_error());
        assert!(!QueryError::Decode("bad".into()).is_client_error());
    }
}
