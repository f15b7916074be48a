//! Schema resolution from the file header or a custom header
//!
//! Resolution reads at most one record (the header line) from the source, so
//! the same reader can be handed to the import afterwards and will start at
//! the first data row.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use super::{sanitize_column_name, IndexSpec, Schema};
use crate::config::{InputConfig, FALLBACK_LIST_SEPARATOR};
use crate::error::SchemaError;
use crate::sqlite::SqliteStore;

/// Split `s` on each separator in turn, returning the first split that
/// produces more than one token. If none does, `s` is the only token.
pub fn try_split(s: &str, separators: &[&str]) -> Vec<String> {
    for sep in separators {
        if sep.is_empty() {
            continue;
        }
        let parts: Vec<&str> = s.split(sep).collect();
        if parts.len() != 1 {
            return parts.into_iter().map(String::from).collect();
        }
    }
    vec![s.to_string()]
}

/// Schema and index specification, ready to be installed into a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub schema: Schema,
    pub indices: IndexSpec,
}

impl ResolvedSchema {
    /// Create the table and every requested index.
    ///
    /// Stops at the first failing statement; nothing is retried.
    pub fn install(&self, store: &SqliteStore) -> Result<(), SchemaError> {
        let create_table = self.schema.create_table_sql();
        info!(statement = %create_table, "Creating SQLite table");
        store
            .execute_ddl(&create_table)
            .map_err(|e| SchemaError::ddl(create_table.as_str(), e))?;

        for (column, statement) in self.indices.create_index_sql() {
            info!(column = %column, statement = %statement, "Creating index");
            store
                .execute_ddl(&statement)
                .map_err(|e| SchemaError::ddl(statement.as_str(), e))?;
        }

        Ok(())
    }
}

/// Derives the [`Schema`] and [`IndexSpec`] for an input file.
pub struct SchemaResolver<'a> {
    input: &'a InputConfig,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(input: &'a InputConfig) -> Self {
        Self { input }
    }

    /// Reader settings shared by header resolution and the import.
    ///
    /// Records are read without header handling (the header is consumed
    /// explicitly) and without a uniform length check (arity is checked per
    /// row by the import). Stray quotes inside unquoted fields are kept as
    /// literal characters.
    pub fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.input.delimiter)
            .has_headers(false)
            .flexible(true)
            .quoting(true)
            .double_quote(true);
        builder
    }

    /// Open the configured file as a record reader.
    pub fn open(&self) -> Result<csv::Reader<BufReader<File>>, SchemaError> {
        let file = File::open(&self.input.file).map_err(|e| SchemaError::Open {
            path: self.input.file.display().to_string(),
            detail: e.to_string(),
        })?;
        Ok(self.reader_builder().from_reader(BufReader::new(file)))
    }

    /// Resolve the schema, consuming the header record when there is one.
    pub fn resolve<R: Read>(
        &self,
        reader: &mut csv::Reader<R>,
    ) -> Result<ResolvedSchema, SchemaError> {
        let custom_header = self
            .input
            .custom_header
            .as_deref()
            .map(|h| self.split_list(h));

        let mut file_header = None;
        if self.input.has_header {
            let mut record = StringRecord::new();
            match reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(SchemaError::HeaderRead(
                        "file is empty, expected a header line".to_string(),
                    ))
                }
                Err(e) => return Err(SchemaError::HeaderRead(e.to_string())),
            }

            if custom_header.is_none() {
                info!("Using the first line of the file as the header");
                file_header = Some(record.iter().map(String::from).collect::<Vec<_>>());
            } else {
                info!("Discarding the file header in favour of the custom header");
            }
        }

        let header = custom_header
            .or(file_header)
            .ok_or(SchemaError::MissingHeader)?;

        let field_count = if self.input.field_count == 0 {
            info!(field_count = header.len(), "Detected field count from header");
            header.len()
        } else {
            self.input.field_count
        };
        if field_count == 0 {
            return Err(SchemaError::ZeroFieldCount);
        }
        if field_count > header.len() {
            return Err(SchemaError::HeaderTooShort {
                field_count,
                header_len: header.len(),
            });
        }
        if field_count < header.len() {
            debug!(
                field_count,
                header_len = header.len(),
                "Ignoring header columns beyond the field count"
            );
        }

        let columns = sanitize_header(&header[..field_count])?;
        let schema = Schema::new(columns);
        let indices = self.resolve_indices(&schema)?;

        Ok(ResolvedSchema { schema, indices })
    }

    fn split_list(&self, raw: &str) -> Vec<String> {
        let delimiter = self.input.delimiter_char().to_string();
        let fallback = FALLBACK_LIST_SEPARATOR.to_string();
        try_split(raw, &[delimiter.as_str(), fallback.as_str()])
    }

    fn resolve_indices(&self, schema: &Schema) -> Result<IndexSpec, SchemaError> {
        let Some(raw) = self.input.custom_indices.as_deref() else {
            return Ok(IndexSpec::default());
        };

        let mut columns: Vec<String> = Vec::new();
        for token in self.split_list(raw) {
            let requested = token.trim();
            let column = schema
                .find_column(requested)
                .ok_or_else(|| SchemaError::UnknownIndexColumn(requested.to_string()))?;
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
        Ok(IndexSpec::new(columns))
    }
}

/// Sanitize header tokens, rejecting empty and colliding identifiers.
fn sanitize_header(raw: &[String]) -> Result<Vec<String>, SchemaError> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(raw.len());
    let mut columns = Vec::with_capacity(raw.len());

    for (position, token) in raw.iter().enumerate() {
        let name = sanitize_column_name(token);
        if name.is_empty() {
            return Err(SchemaError::EmptyColumnName {
                position: position + 1,
                raw: token.clone(),
            });
        }
        if let Some(first) = seen.get(&name) {
            return Err(SchemaError::DuplicateColumn {
                name,
                first: first.to_string(),
                second: token.clone(),
            });
        }
        seen.insert(name.clone(), token.as_str());
        columns.push(name);
    }

    Ok(columns)
}
