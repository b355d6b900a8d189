use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub graph: GraphConfig,

    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    pub log_dir: String,

    /// Files kept in `log_dir` before the oldest one is pruned (default: 3)
    pub max_log_files: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            max_log_files: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Versioned API root, e.g. `https://graph.facebook.com/v18.0`
    pub base_url: String,

    /// Overridden by the `ACCESS_TOKEN` environment variable.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub access_token: String,

    /// Overridden by the `BUSINESS_ACCOUNT_ID` environment variable.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub business_account_id: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: constants::GRAPH_API_BASE.to_string(),
            access_token: String::new(),
            business_account_id: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory receiving the JSON and CSV artifacts
    pub data_dir: String,

    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/instagram".to_string(),
            database_path: "sqlite:db/instagram.db".to_string(),
        }
    }
}

/// Where a loaded [`Config`] came from. Reported once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("defaults (no config file found)"),
        }
    }
}

impl Config {
    pub fn load() -> Result<(Self, ConfigSource)> {
        Self::load_first(&Self::config_paths())
    }

    /// Loads the first existing file in `paths`, else the defaults.
    pub fn load_first(paths: &[PathBuf]) -> Result<(Self, ConfigSource)> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => Ok((Self::load_from_path(path)?, ConfigSource::File(path.clone()))),
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hashtag-harvest").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".hashtag-harvest").join("config.toml"));
        }

        paths
    }

    /// Applies `ACCESS_TOKEN` / `BUSINESS_ACCOUNT_ID` from the process
    /// environment (after `.env` has been loaded).
    pub fn apply_env(&mut self) {
        self.apply_credentials(
            std::env::var(constants::env::ACCESS_TOKEN).ok(),
            std::env::var(constants::env::BUSINESS_ACCOUNT_ID).ok(),
        );
    }

    pub fn apply_credentials(
        &mut self,
        access_token: Option<String>,
        business_account_id: Option<String>,
    ) {
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            self.graph.access_token = token;
        }
        if let Some(account) = business_account_id.filter(|a| !a.is_empty()) {
            self.graph.business_account_id = account;
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.graph.base_url)
            .with_context(|| format!("Invalid Graph API base URL: {}", self.graph.base_url))?;

        if self.graph.request_timeout_seconds == 0 {
            anyhow::bail!("graph.request_timeout_seconds must be > 0");
        }

        if self.general.max_log_files == 0 {
            anyhow::bail!("general.max_log_files must be > 0");
        }

        Ok(())
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.graph.access_token.is_empty() && !self.graph.business_account_id.is_empty()
    }
}
