//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/scanlog/config.toml

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOCAL_LOG_PATH, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHEETS_ENDPOINT, DEFAULT_SHEETS_RANGE, DEFAULT_TOKEN_FILE,
    DEFAULT_VALUE_INPUT_OPTION, SYSTEM_CONFIG_PATH,
};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input settings
    pub capture: CaptureConfig,
    /// Local log settings
    pub local_log: LocalLogConfig,
    /// Google Sheets settings
    pub sheets: SheetsConfig,
    /// Signed webhook settings
    pub webhook: WebhookConfig,
}

/// Where scans are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// evdev device, grabbed exclusively
    Device,
    /// Newline-terminated text on stdin
    Stdin,
}

/// Input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// "device" or "stdin"
    pub mode: CaptureMode,
    /// evdev node or symlink to it (e.g. /dev/input/by-id/usb-...-event-kbd)
    pub device_path: String,
    /// evdev device name to search for when device_path is empty
    pub device_name: String,
    /// Pending scans before the reader blocks
    pub queue_capacity: usize,
}

/// Local log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalLogConfig {
    /// Append scans to the local log
    pub enabled: bool,
    /// Log file path
    pub path: String,
}

/// Google Sheets settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Append scans to a spreadsheet
    pub enabled: bool,
    /// Spreadsheet ID (from the sheet URL)
    pub sheet_id: String,
    /// A1 range rows are appended to
    pub range: String,
    /// "USER_ENTERED" or "RAW"
    pub value_input_option: String,
    /// Cached OAuth token file (kept fresh by an external helper)
    pub token_file: String,
    /// API base URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Signed webhook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// POST scans to a webhook
    pub enabled: bool,
    /// Webhook URL
    pub url: String,
    /// Base64 HMAC-SHA384 key
    pub hmac_key: String,
    /// Identifies this reader station in payloads
    pub device_id: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Device,
            device_path: String::new(),
            device_name: String::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Default for LocalLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: DEFAULT_LOCAL_LOG_PATH.to_string(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sheet_id: String::new(),
            range: DEFAULT_SHEETS_RANGE.to_string(),
            value_input_option: DEFAULT_VALUE_INPUT_OPTION.to_string(),
            token_file: DEFAULT_TOKEN_FILE.to_string(),
            endpoint: DEFAULT_SHEETS_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            hmac_key: String::new(),
            device_id: String::new(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Lookup order for the layered config, highest priority first
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(3);
        if let Some(env_path) = std::env::var_os(CONFIG_ENV_VAR) {
            paths.push(PathBuf::from(env_path));
        }
        paths.extend(default_config_path());
        paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
        paths
    }

    /// First config file that exists, or None for built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        first_existing(Self::search_paths())
    }

    /// Load the first config found on the search path
    ///
    /// A file that exists but cannot be parsed is reported and skipped
    /// in favour of the defaults; `--config` is the strict variant.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            info!("No config file found, using defaults");
            return Self::default();
        };
        Self::load_from_file(&path).unwrap_or_else(|e| {
            warn!("Ignoring config {}: {:#}", path.display(), e);
            Self::default()
        })
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!("Loaded config: {}", path.display());
        Ok(config)
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Check that the enabled features have what they need
    pub fn validate(&self) -> Result<()> {
        if self.capture.queue_capacity == 0 {
            bail!("capture.queue_capacity must be at least 1");
        }
        if self.capture.mode == CaptureMode::Device
            && self.capture.device_path.is_empty()
            && self.capture.device_name.is_empty()
        {
            bail!("capture.mode = \"device\" needs capture.device_path or capture.device_name");
        }
        if self.local_log.enabled && self.local_log.path.is_empty() {
            bail!("local_log.path is empty");
        }
        if self.sheets.enabled && self.sheets.sheet_id.is_empty() {
            bail!("sheets.sheet_id is required when sheets.enabled = true");
        }
        if self.webhook.enabled && (self.webhook.url.is_empty() || self.webhook.hmac_key.is_empty()) {
            bail!("webhook.url and webhook.hmac_key are required when webhook.enabled = true");
        }
        if !self.local_log.enabled && !self.sheets.enabled && !self.webhook.enabled {
            bail!("no sinks enabled");
        }
        Ok(())
    }

    /// Write the default config to `path` (refuses to overwrite unless `force`)
    pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Cannot create {}", parent.display()))?;
            }
        }

        let body = toml::to_string_pretty(&Self::default())?;
        let content = format!(
            "# scanlog configuration\n\
             # Lookup order: --config, ${}, ~/.config/scanlog/config.toml, {}\n\n{}",
            CONFIG_ENV_VAR, SYSTEM_CONFIG_PATH, body
        );
        std::fs::write(path, content)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        info!("Config written: {}", path.display());
        Ok(())
    }
}

fn first_existing(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| p.is_file())
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scanlog").join("config.toml"))
}
