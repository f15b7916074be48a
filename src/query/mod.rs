//! Request-to-SQL translation and result projection
//!
//! A request's query string is the whole query language: every
//! `column=value` pair becomes one equality clause, all clauses are AND'ed,
//! and each matching row comes back as a JSON object.
//!
//! ```text
//! GET /?city=Oslo&year=2021
//!   -> SELECT * FROM csv WHERE city = ?1 AND year = ?2   ["Oslo", "2021"]
//!   -> [{"city": "Oslo", "year": 2021, ...}, ...]
//! ```

pub mod filter;
pub mod projector;

pub use filter::{Filter, FilterQuery};
pub use projector::{Record, ResultProjector};
