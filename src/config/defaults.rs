//! Default constants for csvserve configuration
//!
//! These constants define the default values used by the CLI when no flag or
//! environment variable is provided.

use std::time::Duration;

/// Default listen address for the HTTP query API
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Default field delimiter
pub const DEFAULT_DELIMITER: &str = ",";

/// Default field count (0 means "use the header length")
pub const DEFAULT_FIELD_COUNT: usize = 0;

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default graceful shutdown grace period in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Default reader pool size (0 means "one per available CPU")
pub const DEFAULT_READER_CONNECTIONS: usize = 0;

/// Upper bound on reader connections
pub const MAX_READER_CONNECTIONS: usize = 64;

/// Secondary separator tried for custom header and index lists
pub const FALLBACK_LIST_SEPARATOR: char = ',';

/// Fallback when the available parallelism cannot be determined
pub(crate) const FALLBACK_READER_CONNECTIONS: usize = 4;

/// Default shutdown grace period
pub(crate) const DEFAULT_SHUTDOWN_TIMEOUT: Duration =
    Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS);
