//! Configuration for CronPulse
//!
//! The library itself never reads the environment: callers hand a
//! [`MonitorConfig`] to [`HeartbeatClient`](crate::monitor::HeartbeatClient).
//! The CLI builds one from `~/.cronpulse/config.json` (or `--config`), then
//! applies `CRONPULSE_*` environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PulseError, Result};
use crate::monitor::WrapOptions;

/// Production monitoring service origin.
pub const DEFAULT_BASE_URL: &str = "https://cronpulse.live";

const DEFAULT_USER_AGENT: &str = concat!("cronpulse/", env!("CARGO_PKG_VERSION"));

/// Environment variable overriding [`MonitorConfig::base_url`].
pub const ENV_BASE_URL: &str = "CRONPULSE_BASE_URL";
/// Environment variable overriding [`MonitorConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "CRONPULSE_TIMEOUT_SECS";

/// Client and wrapper settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Origin every endpoint path is appended to.
    pub base_url: String,
    /// Whole-request timeout. `None` keeps the transport's default (none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// `User-Agent` header sent with each ping.
    pub user_agent: String,
    /// Policies for wrapped jobs.
    pub wrap: WrapOptions,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            wrap: WrapOptions::default(),
        }
    }
}

impl MonitorConfig {
    /// Config pointing at a different service origin.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Directory holding CronPulse state (`~/.cronpulse`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cronpulse")
    }

    /// Default config file location.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from the default location, falling back to defaults when the file
    /// is absent, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            debug!("No config file at {:?}, using defaults", path);
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from an explicit JSON file. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply `CRONPULSE_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                PulseError::Config(format!(
                    "{} must be a whole number, got '{}'",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?;
            self.timeout_secs = Some(secs);
        }

        Ok(())
    }
}
