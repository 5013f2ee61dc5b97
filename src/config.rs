//! Configuration for the dashboard client.
//!
//! Loaded with figment from defaults, an optional TOML file and
//! `PITBOARD_`-prefixed environment variables, in that order of precedence
//! (later sources override earlier ones).

use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{DashboardError, Result};

/// Public OpenF1 v1 API.
pub const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

/// Environment variable prefix.
const ENV_PREFIX: &str = "PITBOARD_";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Upstream API root, without trailing slash
    pub base_url: String,
    /// Refresh cadence while a session is live
    pub poll_interval_ms: u64,
    /// Per-request timeout
    pub request_timeout_ms: u64,
    /// User-Agent header sent upstream
    pub user_agent: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 5000,
            request_timeout_ms: 10_000,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load from defaults and `PITBOARD_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] if extraction or validation fails.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// Load from defaults, a TOML file (if it exists) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] if extraction or validation fails.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(DashboardConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::from_figment(figment)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(DashboardConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: DashboardConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or an interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(DashboardError::config("base_url must not be empty"));
        }
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| DashboardError::config(format!("invalid base_url {}: {}", self.base_url, e)))?;

        if self.poll_interval_ms == 0 {
            return Err(DashboardError::config("poll_interval_ms must be greater than 0"));
        }
        if self.request_timeout_ms == 0 {
            return Err(DashboardError::config("request_timeout_ms must be greater than 0"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Base URL with any trailing slash removed
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
