//! Configuration Storage
//!
//! Persistent client settings kept as TOML under the user's configuration
//! directory.

use crate::api::DEFAULT_ENDPOINT_URL;
use crate::error::{AirtableError, Result};
use crate::http::retry::{DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_BACKOFF_SECS, DEFAULT_TOTAL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Directory under the platform configuration directory
const CONFIG_DIR: &str = "airtable-kit";

/// Retry settings as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries
    pub total: u32,
    /// Base of the exponential backoff, in seconds
    pub backoff_factor: f64,
    /// Status codes that trigger a retry
    pub status_forcelist: Vec<u16>,
    /// Upper bound on a single sleep, in seconds
    pub max_backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            total: DEFAULT_TOTAL,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            status_forcelist: vec![429],
            max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Personal access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API endpoint
    pub endpoint_url: String,
    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Key returned fields by field id
    pub use_field_ids: bool,
    /// Retry settings
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            timeout_secs: None,
            use_field_ids: false,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the configuration directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                AirtableError::Config("could not find the configuration directory".to_string())
            })?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the configuration file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load the configuration file from its default location
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    /// Load a configuration file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            AirtableError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Save the configuration to its default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    /// Save the configuration as pretty TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AirtableError::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "saved config");
        Ok(())
    }
}
