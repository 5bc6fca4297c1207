//! Provider configuration
//!
//! [`ProviderConfig`] is read from a TOML file. Every field has a default,
//! so a missing file or an empty table yields a working provider.

use crate::indexer::search_endpoint;
use crate::naming::{DEFAULT_EPISODE_PATTERN, MAX_PADDING_WIDTH, is_valid_episode_pattern};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Longest accepted feed refresh interval (one week)
pub const MAX_REFRESH_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine the configuration directory
    #[error("Failed to determine configuration directory location")]
    ConfigDirectoryNotFound,

    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the KickAss provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Whether the provider takes part in searches at all
    pub enabled: bool,
    /// Indexer base URL
    pub base_url: String,
    /// Alternate base URL; wins over `base_url` when set and non-empty
    pub alt_url: Option<String>,
    /// Season/episode numbering pattern, e.g. `S{season:02}E{episode:02}`
    pub episode_pattern: String,
    /// Minimum minutes between two feed refreshes
    pub refresh_interval_minutes: u64,
    /// Number of result pages requested per search
    pub page_count: u32,
    /// Per-request HTTP timeout in seconds
    pub timeout_seconds: u64,
    /// Custom User-Agent header
    pub user_agent: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://kat.ph/".to_string(),
            alt_url: None,
            episode_pattern: DEFAULT_EPISODE_PATTERN.to_string(),
            refresh_interval_minutes: 15,
            page_count: 2,
            timeout_seconds: 30,
            user_agent: None,
        }
    }
}

impl ProviderConfig {
    /// Loads configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads the default configuration file, falling back to defaults when absent
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Location of the default configuration file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = directories::ProjectDirs::from("org", "katsearch", "kat-search")
            .ok_or(ConfigError::ConfigDirectoryNotFound)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_count == 0 {
            return Err(ConfigError::Invalid(
                "page_count must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.refresh_interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_minutes must be greater than 0".into(),
            ));
        }
        if self.refresh_interval_minutes > MAX_REFRESH_INTERVAL_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "refresh_interval_minutes must be at most {}",
                MAX_REFRESH_INTERVAL_MINUTES
            )));
        }
        if self.episode_pattern.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "episode_pattern must not be empty".into(),
            ));
        }
        if !is_valid_episode_pattern(&self.episode_pattern) {
            return Err(ConfigError::Invalid(format!(
                "episode_pattern has a malformed placeholder or a padding wider than {}",
                MAX_PADDING_WIDTH
            )));
        }
        self.endpoint()?;
        Ok(())
    }

    /// The base URL requests go to, honouring `alt_url`
    pub fn effective_base_url(&self) -> &str {
        match self.alt_url.as_deref().map(str::trim) {
            Some(alt) if !alt.is_empty() => alt,
            _ => &self.base_url,
        }
    }

    /// The JSON search endpoint below the effective base URL
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let base = self.effective_base_url();
        search_endpoint(base)
            .map_err(|e| ConfigError::Invalid(format!("invalid base URL '{}': {}", base, e)))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.saturating_mul(60))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
