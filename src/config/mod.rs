//! Configuration module for csvserve
//!
//! - `defaults` - Default constants and values
//! - `args` - CLI argument definitions
//!
//! [`ServiceArgs`] holds what the user typed; [`ServiceConfig`] is the
//! validated form consumed by the schema resolver, the store and the server.

mod args;
mod defaults;

pub use args::ServiceArgs;
pub use defaults::*;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::{CsvServeError, Result};

use defaults::{DEFAULT_SHUTDOWN_TIMEOUT, FALLBACK_READER_CONNECTIONS};

/// How the input file is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfig {
    /// Path to the delimited file.
    pub file: PathBuf,
    /// Field separator byte (always ASCII).
    pub delimiter: u8,
    /// Explicit field count; 0 means "use the header length".
    pub field_count: usize,
    /// Whether the first record of the file is a header.
    pub has_header: bool,
    /// Raw custom header string, split later by the schema resolver.
    pub custom_header: Option<String>,
    /// Raw index column list, split later by the schema resolver.
    pub custom_indices: Option<String>,
}

impl InputConfig {
    /// Input settings with the CLI defaults for the given file.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            delimiter: b',',
            field_count: DEFAULT_FIELD_COUNT,
            has_header: true,
            custom_header: None,
            custom_indices: None,
        }
    }

    /// The delimiter as a character, for splitting custom lists and logging.
    pub fn delimiter_char(&self) -> char {
        char::from(self.delimiter)
    }
}

/// Complete, validated configuration for a csvserve process.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Input file layout.
    pub input: InputConfig,
    /// Convert numeric-looking cells into JSON numbers.
    pub parse_numbers: bool,
    /// HTTP listen address.
    pub http_addr: SocketAddr,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Size of the read-only connection pool.
    pub reader_connections: usize,
    /// Grace period for in-flight requests on shutdown.
    pub shutdown_timeout: Duration,
}

impl ServiceConfig {
    /// Build a validated configuration from CLI arguments.
    pub fn from_args(args: ServiceArgs) -> Result<Self> {
        let file = args
            .file
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| CsvServeError::Config("no CSV file specified".to_string()))?;

        let delimiter = parse_delimiter(&args.delimiter)?;

        let http_addr: SocketAddr = args.http_addr.parse().map_err(|e| {
            CsvServeError::Config(format!("Invalid HTTP address '{}': {}", args.http_addr, e))
        })?;

        let reader_connections = resolve_reader_connections(args.reader_connections)?;

        Ok(Self {
            input: InputConfig {
                file,
                delimiter,
                field_count: args.field_count,
                has_header: args.has_header,
                custom_header: args.header.filter(|h| !h.is_empty()),
                custom_indices: args.indices.filter(|i| !i.is_empty()),
            },
            parse_numbers: args.parse_numbers,
            http_addr,
            log_level: args.log_level,
            reader_connections,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
        })
    }

    /// Configuration with defaults for everything but the input file.
    pub fn for_file(file: impl Into<PathBuf>) -> Self {
        Self {
            input: InputConfig::new(file),
            parse_numbers: true,
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            reader_connections: FALLBACK_READER_CONNECTIONS,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Log the effective configuration, one line per setting.
    pub fn log_summary(&self) {
        info!(file = %self.input.file.display(), "Using input file");
        info!(delimiter = ?self.input.delimiter_char(), "Using delimiter");
        if self.input.field_count == 0 {
            info!("Field count not provided, it will be detected from the header");
        } else {
            info!(field_count = self.input.field_count, "Using explicit field count");
        }
        if self.input.has_header {
            info!("Assuming the file has a header");
        } else {
            info!("Assuming the file has no header");
        }
        if let Some(ref header) = self.input.custom_header {
            info!(header = %header, "Using a custom header");
        }
        if let Some(ref indices) = self.input.custom_indices {
            info!(indices = %indices, "Using provided index columns");
        }
        info!(
            parse_numbers = self.parse_numbers,
            reader_connections = self.reader_connections,
            shutdown_timeout_secs = self.shutdown_timeout.as_secs(),
            "Query settings"
        );
    }
}

/// Decode a delimiter flag into a single ASCII byte.
///
/// The CSV reader works on bytes, so multi-byte characters are rejected along
/// with quotes and line terminators.
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    let mut chars = raw.chars();
    let c = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(CsvServeError::Config(format!(
                "'{}' is not a valid delimiter, expected a single character",
                raw
            )))
        }
    };

    if !c.is_ascii() {
        return Err(CsvServeError::Config(format!(
            "'{}' is not a valid delimiter, expected an ASCII character",
            raw
        )));
    }
    if matches!(c, '"' | '\n' | '\r') {
        return Err(CsvServeError::Config(format!(
            "{:?} cannot be used as a delimiter",
            c
        )));
    }

    Ok(c as u8)
}

fn resolve_reader_connections(requested: usize) -> Result<usize> {
    if requested > MAX_READER_CONNECTIONS {
        return Err(CsvServeError::Config(format!(
            "reader connections must be at most {}, got {}",
            MAX_READER_CONNECTIONS, requested
        )));
    }
    if requested > 0 {
        return Ok(requested);
    }
    Ok(std::thread::available_parallelism()
        .map(|n| n.get().min(MAX_READER_CONNECTIONS))
        .unwrap_or(FALLBACK_READER_CONNECTIONS))
}
