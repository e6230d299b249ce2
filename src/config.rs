// Configuration loading.
// Merges defaults, an optional TOML file, a .env file, and environment overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::debug;

use crate::cache::DEFAULT_SWEEP_INTERVAL;
use crate::error::{DiscoverError, Result};
use crate::github::GITHUB_API_BASE;
use crate::query::DEFAULT_RATE_LIMIT_LOW_WATER;

pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_API_BASE: &str = "GITHUB_API_BASE";
pub const ENV_LOG_LEVEL: &str = "GH_DISCOVER_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "GH_DISCOVER_LOG_FORMAT";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bearer token for the GitHub API.
    pub token: Option<String>,
    pub api_base: String,
    pub user_agent: String,
    /// Seconds between cache sweeps.
    pub sweep_interval_secs: u64,
    /// Remaining-call count below which a warning is logged.
    pub rate_limit_low_water: u64,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            api_base: GITHUB_API_BASE.to_string(),
            user_agent: concat!("gh-discover/", env!("CARGO_PKG_VERSION")).to_string(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
            rate_limit_low_water: DEFAULT_RATE_LIMIT_LOW_WATER,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration for the running process.
    ///
    /// An explicit `path` must exist. Without one, the per-user config file is
    /// read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "loaded .env file");
        }

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| DiscoverError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Some(api_base) = lookup(ENV_API_BASE) {
            self.api_base = api_base;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT).as_deref().and_then(LogFormat::parse) {
            self.log.format = format;
        }

        // An empty token is the same as no token.
        if self.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.token = None;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            return Err(DiscoverError::Config("api_base must not be empty".to_string()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(DiscoverError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Per-user config file location (e.g. ~/.config/gh-discover/config.toml).
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gh-discover").map(|dirs| dirs.config_dir().join("config.toml"))
}
