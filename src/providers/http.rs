//! HTTP provider for the OpenF1 REST API

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, trace};

use crate::config::DashboardConfig;
use crate::json_utils::parse_json_array;
use crate::provider::{RaceDataProvider, SessionQuery};
use crate::schema::{Driver, LapRecord, PositionSample, Session, TyreStint};
use crate::{DashboardError, Result};

/// Provider backed by `https://api.openf1.org/v1` (or a compatible mirror)
#[derive(Debug, Clone)]
pub struct OpenF1Provider {
    client: Client,
    root: String,
    timeout: Duration,
}

impl OpenF1Provider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] if the configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DashboardError::config(format!("failed to build HTTP client: {}", e)))?;

        info!("OpenF1 provider targeting {}", config.api_root());

        Ok(Self { client, root: config.api_root().to_string(), timeout: config.request_timeout() })
    }

    /// Provider for the public API with default settings.
    pub fn public() -> Result<Self> {
        Self::new(&DashboardConfig::default())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.root, endpoint);
        let started = Instant::now();
        trace!(endpoint, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        let status = response.status();
        // The upstream answers an empty result set with 404 {"detail": "No results found."}
        if status == StatusCode::NOT_FOUND {
            debug!(endpoint, "Upstream reported no results");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(DashboardError::Status { endpoint: endpoint.to_string(), status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|e| self.classify(endpoint, e))?;
        let records: Vec<T> = parse_json_array(&body, endpoint)?;

        debug!(
            endpoint,
            records = records.len(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(records)
    }

    fn classify(&self, endpoint: &str, err: reqwest::Error) -> DashboardError {
        if err.is_timeout() {
            DashboardError::Timeout { endpoint: endpoint.to_string(), duration: self.timeout }
        } else {
            err.into()
        }
    }
}

/// Query pairs for a session filter.
///
/// `date_end<=` is expressed as the key `date_end<` with value `YYYY-MM-DD`,
/// which encodes to the upstream's comparison syntax.
fn session_query_pairs(query: &SessionQuery) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(name) = &query.session_name {
        pairs.push(("session_name", name.clone()));
    }
    if let Some(day) = query.ended_on_or_before {
        pairs.push(("date_end<", day.format("%Y-%m-%d").to_string()));
    }
    pairs
}

#[async_trait]
impl RaceDataProvider for OpenF1Provider {
    async fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>> {
        self.fetch("/sessions", &session_query_pairs(query)).await
    }

    async fn drivers(&self, session_key: u32) -> Result<Vec<Driver>> {
        self.fetch("/drivers", &[("session_key", session_key.to_string())]).await
    }

    async fn positions(&self, session_key: u32) -> Result<Vec<PositionSample>> {
        self.fetch("/position", &[("session_key", session_key.to_string())]).await
    }

    async fn laps(&self, session_key: u32, driver_number: Option<u32>) -> Result<Vec<LapRecord>> {
        let mut query = vec![("session_key", session_key.to_string())];
        if let Some(driver) = driver_number {
            query.push(("driver_number", driver.to_string()));
        }
        self.fetch("/laps", &query).await
    }

    async fn stints(&self, session_key: u32, driver_number: u32) -> Result<Vec<TyreStint>> {
        self.fetch(
            "/stints",
            &[("session_key", session_key.to_string()), ("driver_number", driver_number.to_string())],
        )
        .await
    }
}
