//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Connection
// ============================================================================

/// Request timeout when none is configured (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Characters of an error response body kept for diagnostics.
pub const ERROR_SNIPPET_CHARS: usize = 200;

/// Characters of the service root page returned by a connection check.
pub const CONNECTION_SNIPPET_CHARS: usize = 1_000;

// ============================================================================
// Environment
// ============================================================================

/// Environment variable naming a config file path.
pub const CONFIG_PATH_ENV: &str = "T8_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "t8_client.toml";

pub const HOST_ENV: &str = "T8_HOST";
pub const USER_ENV: &str = "T8_USER";
pub const PASSWORD_ENV: &str = "T8_PASSWORD";

// ============================================================================
// Analysis
// ============================================================================

/// Lower edge of the default analysis band (Hz).
pub const DEFAULT_FMIN_HZ: f64 = 0.0;

// ============================================================================
// Storage
// ============================================================================

/// Root directory for downloaded and computed files.
pub const DEFAULT_DATA_DIR: &str = "data";
