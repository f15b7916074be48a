//! SQLite store implementation
//!
//! `SqliteStore` owns one in-memory SQLite database opened in shared-cache
//! mode. A single writer connection is used while the table is created and
//! loaded; a fixed pool of `query_only` reader connections to the same
//! database serves requests afterwards, so concurrent queries do not queue
//! behind one connection.

use parking_lot::{Mutex, MutexGuard};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{CsvServeError, QueryError};

/// Result of a query against the loaded table.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row data in the store's natural order.
    pub rows: Vec<QueryResultRow>,
    /// Total number of rows returned.
    pub row_count: usize,
    /// Wall-clock execution time in milliseconds.
    pub execution_ms: u64,
}

/// A single result row; one text cell per column.
#[derive(Debug, Clone)]
pub struct QueryResultRow {
    pub values: Vec<String>,
}

/// The embedded SQLite store.
///
/// All connections point at the same named in-memory database. The database
/// lives as long as at least one connection is open, i.e. as long as the
/// store itself.
pub struct SqliteStore {
    /// Shared-cache URI of the in-memory database.
    uri: String,
    /// Connection used for DDL and the import.
    writer: Mutex<Connection>,
    /// Read-only connections used by queries.
    readers: Vec<Mutex<Connection>>,
    /// Round-robin cursor into `readers`.
    next_reader: AtomicUsize,
}

impl SqliteStore {
    /// Create a new in-memory store with `reader_connections` query connections.
    pub fn open_in_memory(reader_connections: usize) -> crate::Result<Self> {
        let uri = format!(
            "file:csvserve-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4()
        );

        let writer = Connection::open(&uri)
            .map_err(|e| CsvServeError::store("open in-memory SQLite database", e))?;

        let readers = (0..reader_connections.max(1))
            .map(|_| open_reader(&uri).map(Mutex::new))
            .collect::<crate::Result<Vec<_>>>()?;

        info!(
            readers = readers.len(),
            "SQLite store initialized (in-memory, shared cache)"
        );

        Ok(Self {
            uri,
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
        })
    }

    /// URI of the underlying database.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Number of reader connections in the pool.
    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Execute a DDL statement on the writer connection.
    pub fn execute_ddl(&self, sql: &str) -> rusqlite::Result<()> {
        self.writer.lock().execute_batch(sql)
    }

    /// Exclusive access to the writer connection, for bulk loading.
    pub fn writer(&self) -> MutexGuard<'_, Connection> {
        self.writer.lock()
    }

    /// Run a parameterized query on a reader connection and collect every row.
    ///
    /// Preparing or starting the query fails with [`QueryError::Execution`];
    /// failing to step or decode a row fails with [`QueryError::Decode`].
    pub fn query(&self, sql: &str, args: &[String]) -> Result<QueryResult, QueryError> {
        let start = Instant::now();
        let conn = self.acquire_reader();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        let column_count = stmt.column_count();
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut cursor = stmt
            .query(params_from_iter(args.iter()))
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        let mut rows = Vec::new();
        loop {
            let row = match cursor.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => return Err(QueryError::Decode(e.to_string())),
            };

            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value = row
                    .get_ref(i)
                    .map_err(|e| QueryError::Decode(e.to_string()))?;
                values.push(cell_to_string(value, &columns[i])?);
            }
            rows.push(QueryResultRow { values });
        }

        let row_count = rows.len();
        let execution_ms = start.elapsed().as_millis() as u64;
        debug!(row_count, execution_ms, "Query completed");

        Ok(QueryResult {
            columns,
            rows,
            row_count,
            execution_ms,
        })
    }

    /// Count rows in a table, used for startup reporting and tests.
    pub fn count_rows(&self, table: &str) -> crate::Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\""));
        let conn = self.acquire_reader();
        conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(|e| CsvServeError::store("count rows", e))
    }

    // ── Private helpers ─────────────────────────────────────────────────

    /// Pick a reader: the first idle one starting at the round-robin cursor,
    /// or wait on the cursor's connection if all are busy.
    fn acquire_reader(&self) -> MutexGuard<'_, Connection> {
        let n = self.readers.len();
        let start = self.next_reader.fetch_add(1, Ordering::Relaxed) % n;
        for offset in 0..n {
            if let Some(guard) = self.readers[(start + offset) % n].try_lock() {
                return guard;
            }
        }
        self.readers[start].lock()
    }
}

fn open_reader(uri: &str) -> crate::Result<Connection> {
    let conn = Connection::open(uri)
        .map_err(|e| CsvServeError::store("open reader connection", e))?;
    conn.execute_batch("PRAGMA query_only = ON;")
        .map_err(|e| CsvServeError::store("configure reader connection", e))?;
    Ok(conn)
}

/// Every column is declared TEXT, so anything else means the row cannot be
/// represented as a string cell.
fn cell_to_string(value: ValueRef<'_>, column: &str) -> Result<String, QueryError> {
    match value {
        ValueRef::Text(s) => std::str::from_utf8(s)
            .map(String::from)
            .map_err(|e| QueryError::Decode(format!("column {}: {}", column, e))),
        ValueRef::Integer(n) => Ok(n.to_string()),
        ValueRef::Real(f) => Ok(f.to_string()),
        ValueRef::Null => Err(QueryError::Decode(format!(
            "column {}: unexpected NULL value",
            column
        ))),
        ValueRef::Blob(_) => Err(QueryError::Decode(format!(
            "column {}: unexpected BLOB value",
            column
        ))),
    }
}

// -- Unit tests --
