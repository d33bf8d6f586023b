//! Global constants for scanlog
//!
//! Consolidates queue sizing, default paths and remote endpoints
//! to eliminate magic values throughout the codebase.

// ============================================================================
// Queue
// ============================================================================

/// Pending scans the dispatcher queue absorbs before the producer blocks
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

// ============================================================================
// Paths
// ============================================================================

/// Local append-only scan log
pub const DEFAULT_LOCAL_LOG_PATH: &str = "raw.csv";

/// Cached OAuth token (written by an external authorization helper)
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Directory scanned when looking a reader up by name
pub const INPUT_DEVICE_DIR: &str = "/dev/input";

/// System-wide config path
pub const SYSTEM_CONFIG_PATH: &str = "/etc/scanlog/config.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SCANLOG_CONFIG";

// ============================================================================
// Remote endpoints
// ============================================================================

/// Google Sheets API base URL
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";

/// Range rows are appended to
pub const DEFAULT_SHEETS_RANGE: &str = "Raw Scans!A1:B";

/// How the Sheets API interprets appended values
pub const DEFAULT_VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// HTTP timeout for remote sinks (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Body the webhook returns when it accepted a batch
pub const WEBHOOK_SUCCESS_BODY: &str = "success";
