//! Command-line arguments for csvserve
//!
//! This module defines the CLI arguments structure using clap. Every flag can
//! also be set through a `CSV_`-prefixed environment variable.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use super::defaults::*;

/// Command-line arguments for csvserve
#[derive(Parser, Debug, Clone)]
#[command(name = "csvserve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve a delimited text file as a read-only JSON query API")]
pub struct ServiceArgs {
    /// Path to the delimited text file to load
    #[arg(long, env = "CSV_FILE")]
    pub file: Option<PathBuf>,

    /// Field separator; must be a single ASCII character.
    /// The CSV reader splits on bytes, so multi-byte characters such as `§` are rejected.
    #[arg(long, env = "CSV_DELIMITER", default_value = DEFAULT_DELIMITER)]
    pub delimiter: String,

    /// Number of fields per row (0 = use the header length)
    #[arg(long, env = "CSV_FIELD_COUNT", default_value_t = DEFAULT_FIELD_COUNT)]
    pub field_count: usize,

    /// Whether the first line of the file is a header.
    /// Pass `--has-header false` for headerless files (a custom header is then required).
    #[arg(long, env = "CSV_HAS_HEADER", default_value_t = true, action = ArgAction::Set)]
    pub has_header: bool,

    /// Custom header, split on the delimiter or on commas.
    /// When the file also has a header line, that line is skipped.
    #[arg(long, env = "CSV_HEADER")]
    pub header: Option<String>,

    /// Columns to create secondary indexes for, split on the delimiter or on commas
    #[arg(long, alias = "indicies", env = "CSV_INDICES")]
    pub indices: Option<String>,

    /// Convert numeric-looking values (thousands separators allowed) into JSON numbers
    #[arg(long, env = "CSV_PARSE_NUMBERS", default_value_t = true, action = ArgAction::Set)]
    pub parse_numbers: bool,

    /// Address to listen on for the HTTP query API
    #[arg(long, env = "CSV_HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    pub http_addr: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "CSV_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Number of read-only store connections serving queries (0 = one per CPU)
    #[arg(long, env = "CSV_READER_CONNECTIONS", default_value_t = DEFAULT_READER_CONNECTIONS)]
    pub reader_connections: usize,

    /// Seconds to wait for in-flight requests on shutdown before forcing closure
    #[arg(long, env = "CSV_SHUTDOWN_TIMEOUT_SECS", default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    pub shutdown_timeout_secs: u64,
}
