//! Embedded SQLite store for the loaded file
//!
//! The whole file is materialized into a single in-memory table named `csv`
//! with one TEXT column per header name. SQLite is small, needs no
//! configuration, and handles the equality lookups (and optional secondary
//! indexes) the query API needs.
//!
//! ## Lifecycle
//!
//! 1. [`SqliteStore::open_in_memory`] creates the database and reader pool.
//! 2. The schema resolver installs the table and indexes.
//! 3. [`CsvImporter`] loads every data row through the writer connection.
//! 4. Requests run through [`SqliteStore::query`] on reader connections.

pub mod engine;
pub mod import;

pub use engine::{QueryResult, QueryResultRow, SqliteStore};
pub use import::CsvImporter;
