//! Configuration for the heart rate log.

use crate::audit::ACCESS_LOG_FILE;
use crate::record::ZoneSource;
use crate::store::file::RECORDS_FILE;
use crate::store::PermissionSet;
use crate::sync::{FilterMode, DEFAULT_LOOKBACK_DAYS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory name used under the platform config and data dirs.
const APP_DIR: &str = "synheart-heart-rate";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the records file and access log
    pub data_path: PathBuf,

    /// Days of history loaded on start and after each save
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// How list filters are matched
    #[serde(default)]
    pub filter_mode: FilterMode,

    /// IANA time zone for reading and showing times (system zone when unset)
    #[serde(default)]
    pub timezone: Option<String>,

    /// Permissions the user has granted
    #[serde(default)]
    pub consent: PermissionSet,
}

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            data_path: data_dir,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            filter_mode: FilterMode::default(),
            timezone: None,
            consent: PermissionSet::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.zone()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Path of the JSON records file.
    pub fn records_path(&self) -> PathBuf {
        self.data_path.join(RECORDS_FILE)
    }

    /// Path of the persisted access log.
    pub fn access_log_path(&self) -> PathBuf {
        self.data_path.join(ACCESS_LOG_FILE)
    }

    /// Resolve the configured time zone.
    pub fn zone(&self) -> Result<ZoneSource, ConfigError> {
        match self.timezone.as_deref() {
            None => Ok(ZoneSource::System),
            Some(name) => ZoneSource::named(name)
                .ok_or_else(|| ConfigError::InvalidTimezone(name.to_string())),
        }
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidTimezone(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidTimezone(name) => write!(f, "Unknown time zone: {name}"),
        }
    }
}

impl std::error::Error for ConfigError {}
