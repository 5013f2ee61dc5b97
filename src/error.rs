//! Error types for race data retrieval.
//!
//! Every failure the dashboard can hit is recoverable: the worst outcome is a
//! stale or empty display. Errors still carry structured context so callers
//! can log them and decide whether a retry on the next tick is worthwhile.
//!
//! ## Error Categories
//!
//! - **Network Errors**: The request never produced a response
//! - **Status Errors**: The upstream answered with a non-2xx status
//! - **Decode Errors**: The body was not the JSON array we expected
//! - **Empty Results**: A well-formed but empty answer (e.g. no sessions yet)
//! - **Configuration Errors**: Invalid base URL, zero intervals, bad TOML
//! - **Fixture Errors**: Replay files missing or unreadable
//!
//! A foreign key with no match in a joined table (a driver number with no
//! driver record) is *not* an error; it degrades to an `N/A`
//! placeholder in the affected field.
//!
//! ```rust
//! use pitboard::DashboardError;
//!
//! let error = DashboardError::network("/position", "connection reset");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for dashboard operations.
pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

/// Main error type for dashboard operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DashboardError {
    #[error("Request to {endpoint} failed: {reason}")]
    Network {
        endpoint: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Upstream returned HTTP {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Malformed response from {endpoint}: {details}")]
    Decode { endpoint: String, details: String },

    #[error("No {resource} available")]
    EmptyResult { resource: String },

    #[error("Request to {endpoint} timed out after {duration:?}")]
    Timeout { endpoint: String, duration: Duration },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Replay fixture error: {path}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DashboardError {
    /// Returns whether the next poll tick has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            DashboardError::Network { .. } => true,
            DashboardError::Timeout { .. } => true,
            DashboardError::Status { status, .. } => *status == 429 || *status >= 500,
            DashboardError::EmptyResult { .. } => true,
            DashboardError::Decode { .. } => false,
            DashboardError::Config { .. } => false,
            DashboardError::Fixture { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DashboardError::Network { .. } => vec![
                "Check network connectivity",
                "Verify the configured base URL is reachable",
                "Wait for the next refresh tick",
            ],
            DashboardError::Status { .. } => vec![
                "Back off if the upstream is rate limiting",
                "Verify the session key still exists upstream",
                "Check the upstream status page",
            ],
            DashboardError::Decode { .. } => vec![
                "Check whether the upstream schema has changed",
                "Verify the base URL points at the OpenF1 v1 API",
            ],
            DashboardError::EmptyResult { .. } => vec![
                "No data has been published yet for this query",
                "Select a different race",
            ],
            DashboardError::Timeout { .. } => vec![
                "Increase request_timeout_ms",
                "Check network latency to the upstream",
            ],
            DashboardError::Config { .. } => vec![
                "Check PITBOARD_* environment variables",
                "Check the TOML configuration file",
            ],
            DashboardError::Fixture { .. } => vec![
                "Check the replay directory exists and is readable",
                "Verify fixture files are JSON arrays",
            ],
        }
    }

    /// Helper constructor for network failures without an underlying source.
    pub fn network(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        DashboardError::Network { endpoint: endpoint.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for network failures with source.
    pub fn network_with_source(
        endpoint: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        DashboardError::Network {
            endpoint: endpoint.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Helper constructor for empty upstream answers.
    pub fn empty_result(resource: impl Into<String>) -> Self {
        DashboardError::EmptyResult { resource: resource.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        DashboardError::Config { reason: reason.into() }
    }

    /// Helper constructor for fixture errors with path context.
    pub fn fixture_error(path: PathBuf, source: std::io::Error) -> Self {
        DashboardError::Fixture { path, source }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|url| url.path().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        if let Some(status) = err.status() {
            return DashboardError::Status { endpoint, status: status.as_u16() };
        }
        if err.is_decode() {
            return DashboardError::Decode { endpoint, details: err.to_string() };
        }
        let reason = if err.is_timeout() {
            "timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            "request failed".to_string()
        };
        DashboardError::Network { endpoint, reason, source: Some(Box::new(err)) }
    }
}

impl From<figment::Error> for DashboardError {
    fn from(err: figment::Error) -> Self {
        DashboardError::Config { reason: err.to_string() }
    }
}
