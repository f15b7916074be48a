#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # csvserve
//!
//! csvserve loads a delimited text file into an embedded SQLite table and
//! serves it as a read-only JSON API where every query parameter is an
//! equality filter.
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve a comma-separated file with a header line
//! $ csvserve --file people.csv
//!
//! # Pipe-separated, no header line, custom column names, indexed lookups
//! $ csvserve --file dump.txt --delimiter '|' --has-header false \
//!     --header 'id|name|city' --indices id,city
//!
//! # Query
//! $ curl 'http://localhost:8080/?city=Oslo'
//! [{"city":"Oslo","id":7,"name":"Kari"}]
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use csvserve::{AppContext, Filter, Result, ServiceConfig};
//!
//! fn main() -> Result<()> {
//!     let config = ServiceConfig::for_file("people.csv");
//!     let context = AppContext::load(&config)?;
//!
//!     let records = context.query(&Filter::from_pairs([("city", "Oslo")]))?;
//!     println!("{} matches", records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Header sanitizing and schema resolution
//! - [`sqlite`] - In-memory store and bulk import
//! - [`query`] - Filter translation and JSON projection
//! - [`server`] - Application context and HTTP API
//! - [`config`] - CLI and environment configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod server;
pub mod sqlite;

pub use config::{InputConfig, ServiceArgs, ServiceConfig};
pub use error::{CsvServeError, ImportError, QueryError, Result, SchemaError};
pub use query::{Filter, Record, ResultProjector};
pub use schema::{IndexSpec, Schema, SchemaResolver};
pub use server::{AppContext, Server};
pub use sqlite::{CsvImporter, SqliteStore};
