//! Bulk load of data rows into the `csv` table
//!
//! Rows are streamed from the same record reader the schema resolver used, so
//! the header line (if any) has already been consumed. Each row becomes one
//! execution of a cached positional `INSERT`:
//!
//! ```sql
//! INSERT INTO csv VALUES (?1, ?2, ..., ?n)
//! ```
//!
//! All rows go in under one transaction. The first failure aborts the load and
//! rolls it back, leaving the table empty.

use csv::StringRecord;
use rusqlite::{params_from_iter, Connection};
use std::io::Read;
use tracing::{debug, info};

use super::SqliteStore;
use crate::error::ImportError;
use crate::schema::Schema;

/// Rows between progress log lines.
const PROGRESS_INTERVAL: u64 = 100_000;

/// Loads data rows into a store according to a resolved schema.
pub struct CsvImporter<'a> {
    store: &'a SqliteStore,
    schema: &'a Schema,
}

impl<'a> CsvImporter<'a> {
    pub fn new(store: &'a SqliteStore, schema: &'a Schema) -> Self {
        Self { store, schema }
    }

    /// Insert every remaining record from `reader`.
    ///
    /// Returns the number of rows inserted.
    pub fn import<R: Read>(&self, reader: &mut csv::Reader<R>) -> Result<u64, ImportError> {
        let mut conn = self.store.writer();
        let tx = conn
            .transaction()
            .map_err(|e| ImportError::Transaction(format!("begin: {}", e)))?;

        let imported = self.insert_rows(&tx, reader)?;

        tx.commit()
            .map_err(|e| ImportError::Transaction(format!("commit: {}", e)))?;
        info!(rows = imported, "Successfully imported rows into SQLite");
        Ok(imported)
    }

    fn insert_rows<R: Read>(
        &self,
        conn: &Connection,
        reader: &mut csv::Reader<R>,
    ) -> Result<u64, ImportError> {
        let field_count = self.schema.field_count();
        let insert_sql = self.schema.insert_sql();

        let mut stmt = conn.prepare_cached(&insert_sql).map_err(|e| ImportError::Insert {
            line: 0,
            detail: format!("could not prepare {}: {}", insert_sql, e),
        })?;

        info!("Importing data into SQLite");
        let mut record = StringRecord::new();
        let mut imported: u64 = 0;

        loop {
            match reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    return Err(ImportError::Read {
                        line: e.position().map(|p| p.line()),
                        detail: e.to_string(),
                    })
                }
            }

            let line = record.position().map(|p| p.line()).unwrap_or(0);
            check_arity(&record, field_count, line)?;

            stmt.execute(params_from_iter(record.iter().take(field_count)))
                .map_err(|e| ImportError::Insert {
                    line,
                    detail: e.to_string(),
                })?;

            imported += 1;
            if imported % PROGRESS_INTERVAL == 0 {
                debug!(rows = imported, "Import progress");
            }
        }

        Ok(imported)
    }
}

/// A row must supply at least `field_count` cells; extra cells are ignored.
fn check_arity(record: &StringRecord, field_count: usize, line: u64) -> Result<(), ImportError> {
    if record.len() < field_count {
        return Err(ImportError::RowArity {
            line,
            expected: field_count,
            found: record.len(),
        });
    }
    if record.len() > field_count {
        debug!(
            line,
            found = record.len(),
            expected = field_count,
            "Ignoring extra fields"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;
    use crate::schema::SchemaResolver;

    fn load(input: &InputConfig, data: &str) -> (SqliteStore, Result<u64, ImportError>) {
        let store = SqliteStore::open_in_memory(1).unwrap();
        let resolver = SchemaResolver::new(input);
        let mut reader = resolver.reader_builder().from_reader(data.as_bytes());
        let resolved = resolver.resolve(&mut reader).unwrap();
        resolved.install(&store).unwrap();
        let result = CsvImporter::new(&store, &resolved.schema).import(&mut reader);
        (store, result)
    }

    fn all_rows(store: &SqliteStore) -> Vec<Vec<String>> {
        store
            .query("SELECT * FROM csv", &[])
            .unwrap()
            .rows
            .into_iter()
            .map(|r| r.values)
            .collect()
    }

    #[test]
    fn test_import_counts_rows() {
        let input = InputConfig::new("unused.csv");
        let (store, result) = load(&input, "id,name\n1,ann\n2,bob\n");
        assert_eq!(result.unwrap(), 2);
        assert_eq!(all_rows(&store), vec![vec!["1", "ann"], vec!["2", "bob"]]);
    }

    #[test]
    fn test_short_row_fails_import() {
        let input = InputConfig::new("unused.csv");
        let (store, result) = load(&input, "a,b,c\n1,2,3\n4,5\n");
        assert_eq!(
            result.unwrap_err(),
            ImportError::RowArity {
                line: 3,
                expected: 3,
                found: 2
            }
        );
        // The row before the bad one is rolled back with it.
        assert_eq!(store.count_rows("csv").unwrap(), 0);
    }

    #[test]
    fn test_long_row_is_truncated() {
        let input = InputConfig::new("unused.csv");
        let (store, result) = load(&input, "a,b\n1,2,3,4\n");
        assert_eq!(result.unwrap(), 1);
        assert_eq!(all_rows(&store), vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_lenient_quotes() {
        let input = InputConfig::new("unused.csv");
        let (store, result) = load(&input, "a,b\n5\" tall,x\n\"q,uoted\",\"say \"\"hi\"\"\"\n");
        assert_eq!(result.unwrap(), 2);
        assert_eq!(
            all_rows(&store),
            vec![vec!["5\" tall", "x"], vec!["q,uoted", "say \"hi\""]]
        );
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        let store = SqliteStore::open_in_memory(1).unwrap();
        let input = InputConfig::new("unused.csv");
        let resolver = SchemaResolver::new(&input);
        let data: &[u8] = b"a,b\n1,\xff\xfe\n";
        let mut reader = resolver.reader_builder().from_reader(data);
        let resolved = resolver.resolve(&mut reader).unwrap();
        resolved.install(&store).unwrap();
        let err = CsvImporter::new(&store, &resolved.schema)
            .import(&mut reader)
            .unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
    }

    #[test]
    fn test_empty_lines_are_skipped() {
        let input = InputConfig::new("unused.csv");
        let (_store, result) = load(&input, "a\n1\n\n2\n");
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn test_pipe_delimited_with_custom_header() {
        let input = InputConfig {
            delimiter: b'|',
            custom_header: Some("x|y".to_string()),
            ..InputConfig::new("unused.csv")
        };
        let (store, result) = load(&input, "ignored|header\nfoo|bar\n");
        assert_eq!(result.unwrap(), 1);
        assert_eq!(all_rows(&store), vec![vec!["foo", "bar"]]);
    }
}
