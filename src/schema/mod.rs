//! Table schema derived from the input header
//!
//! The schema is resolved once at startup (see [`resolver`]) and frozen for
//! the lifetime of the process. Every column is stored as TEXT; typing only
//! happens when results are projected back into JSON.
//!
//! ```sql
//! CREATE TABLE csv (<col_1> text, <col_2> text, ...);
//! CREATE INDEX <col>_idx ON csv (<col>);
//! ```

pub mod resolver;
pub mod sanitize;

pub use resolver::{try_split, ResolvedSchema, SchemaResolver};
pub use sanitize::sanitize_column_name;

/// Name of the single table every file is loaded into.
pub const TABLE_NAME: &str = "csv";

/// Resolved column layout of the loaded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Create a schema from already-sanitized, unique column names.
    ///
    /// Callers outside the resolver are expected to have validated the
    /// names; the resolver is the only producer in the binary.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Column names in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of cells every data row must supply.
    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    /// Look up a column the way SQLite resolves unquoted identifiers
    /// (ASCII case-insensitive), returning the canonical name.
    pub fn find_column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// `CREATE TABLE` statement with one text column per header name.
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} text", c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", TABLE_NAME, columns)
    }

    /// Positional `INSERT` statement taking exactly `field_count` arguments.
    pub fn insert_sql(&self) -> String {
        let placeholders = (1..=self.field_count())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        format!("INSERT INTO {} VALUES ({})", TABLE_NAME, placeholders)
    }
}

/// Columns that get a secondary index at import time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSpec {
    columns: Vec<String>,
}

impl IndexSpec {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Deterministic index name for a column.
    pub fn index_name(column: &str) -> String {
        format!("{}_idx", column)
    }

    /// One `(column, CREATE INDEX ...)` pair per indexed column.
    pub fn create_index_sql(&self) -> Vec<(&str, String)> {
        self.columns
            .iter()
            .map(|c| {
                (
                    c.as_str(),
                    format!(
                        "CREATE INDEX {} ON {} ({})",
                        Self::index_name(c),
                        TABLE_NAME,
                        c
                    ),
                )
            })
            .collect()
    }
}
