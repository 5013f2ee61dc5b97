//! Replay provider for recorded OpenF1 payloads
//!
//! Serves previously captured JSON arrays from memory or from a directory:
//!
//! ```text
//! <dir>/sessions.json
//! <dir>/<session_key>/drivers.json
//! <dir>/<session_key>/position.json
//! <dir>/<session_key>/laps.json
//! <dir>/<session_key>/stints.json
//! ```
//!
//! Per-session files are optional and default to empty arrays. A cutoff
//! timestamp can hide samples and laps recorded after it, which replays a
//! finished race as if it were still running.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::json_utils::parse_json_array;
use crate::provider::{RaceDataProvider, SessionQuery};
use crate::schema::{Driver, LapRecord, PositionSample, Session, TyreStint};
use crate::{DashboardError, Result};

/// Recorded arrays for one session
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub drivers: Vec<Driver>,
    pub positions: Vec<PositionSample>,
    pub laps: Vec<LapRecord>,
    pub stints: Vec<TyreStint>,
}

/// Everything a replay provider can serve
#[derive(Debug, Clone, Default)]
pub struct ReplayData {
    pub sessions: Vec<Session>,
    pub by_session: HashMap<u32, SessionData>,
}

impl ReplayData {
    /// Load a fixture directory.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Fixture`] if `sessions.json` cannot be read and
    /// [`DashboardError::Decode`] if any file is not a JSON array of records.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let sessions: Vec<Session> = read_required(&dir.join("sessions.json"))?;

        let mut by_session = HashMap::new();
        for key in sessions.iter().filter_map(|s| s.session_key) {
            let session_dir = dir.join(key.to_string());
            if !session_dir.is_dir() {
                continue;
            }
            let data = SessionData {
                drivers: read_optional(&session_dir.join("drivers.json"))?,
                positions: read_optional(&session_dir.join("position.json"))?,
                laps: read_optional(&session_dir.join("laps.json"))?,
                stints: read_optional(&session_dir.join("stints.json"))?,
            };
            debug!(
                session_key = key,
                positions = data.positions.len(),
                laps = data.laps.len(),
                "Loaded replay session"
            );
            by_session.insert(key, data);
        }

        info!("Loaded replay fixtures from {} ({} sessions)", dir.display(), sessions.len());
        Ok(Self { sessions, by_session })
    }
}

fn read_required<T: DeserializeOwned>(path: &PathBuf) -> Result<Vec<T>> {
    let bytes = std::fs::read(path).map_err(|e| DashboardError::fixture_error(path.clone(), e))?;
    parse_json_array(&bytes, &path.display().to_string())
}

fn read_optional<T: DeserializeOwned>(path: &PathBuf) -> Result<Vec<T>> {
    if path.exists() { read_required(path) } else { Ok(Vec::new()) }
}

/// Provider serving [`ReplayData`]
#[derive(Debug, Default)]
pub struct ReplayProvider {
    data: RwLock<ReplayData>,
    cutoff: RwLock<Option<DateTime<Utc>>>,
    latency: Option<Duration>,
}

impl ReplayProvider {
    pub fn new(data: ReplayData) -> Self {
        Self { data: RwLock::new(data), cutoff: RwLock::new(None), latency: None }
    }

    /// Open a fixture directory (see module docs for the layout).
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ReplayData::from_dir(dir)?))
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Hide position samples and laps recorded after `cutoff`.
    pub fn set_cutoff(&self, cutoff: Option<DateTime<Utc>>) {
        *self.cutoff.write().unwrap_or_else(PoisonError::into_inner) = cutoff;
    }

    /// Mutate the served data in place.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut ReplayData),
    {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut data);
    }

    async fn pace(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn cutoff(&self) -> Option<DateTime<Utc>> {
        *self.cutoff.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<T, F>(&self, session_key: u32, f: F) -> Vec<T>
    where
        F: FnOnce(&SessionData) -> Vec<T>,
    {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.by_session.get(&session_key).map(f).unwrap_or_default()
    }
}

fn visible(at: Option<DateTime<Utc>>, cutoff: Option<DateTime<Utc>>) -> bool {
    match (at, cutoff) {
        (Some(at), Some(cutoff)) => at <= cutoff,
        _ => true,
    }
}

#[async_trait]
impl RaceDataProvider for ReplayProvider {
    async fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>> {
        self.pace().await;
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.sessions.iter().filter(|s| query.matches(s)).cloned().collect())
    }

    async fn drivers(&self, session_key: u32) -> Result<Vec<Driver>> {
        self.pace().await;
        Ok(self.with_session(session_key, |s| s.drivers.clone()))
    }

    async fn positions(&self, session_key: u32) -> Result<Vec<PositionSample>> {
        self.pace().await;
        let cutoff = self.cutoff();
        Ok(self.with_session(session_key, |s| {
            s.positions.iter().filter(|p| visible(p.date, cutoff)).cloned().collect()
        }))
    }

    async fn laps(&self, session_key: u32, driver_number: Option<u32>) -> Result<Vec<LapRecord>> {
        self.pace().await;
        let cutoff = self.cutoff();
        Ok(self.with_session(session_key, |s| {
            s.laps
                .iter()
                .filter(|l| driver_number.is_none() || l.driver_number == driver_number)
                .filter(|l| visible(l.date_start, cutoff))
                .cloned()
                .collect()
        }))
    }

    async fn stints(&self, session_key: u32, driver_number: u32) -> Result<Vec<TyreStint>> {
        self.pace().await;
        Ok(self.with_session(session_key, |s| {
            s.stints.iter().filter(|st| st.driver_number == Some(driver_number)).cloned().collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_race, ts};

    #[tokio::test]
    async fn serves_records_per_session() {
        let provider = ReplayProvider::new(sample_race());

        assert_eq!(provider.drivers(9590).await.unwrap().len(), 3);
        assert!(provider.drivers(1).await.unwrap().is_empty());

        let laps = provider.laps(9590, Some(16)).await.unwrap();
        assert!(!laps.is_empty());
        assert!(laps.iter().all(|l| l.driver_number == Some(16)));
    }

    #[tokio::test]
    async fn cutoff_hides_later_samples() {
        let provider = ReplayProvider::new(sample_race());
        let all = provider.positions(9590).await.unwrap().len();

        provider.set_cutoff(Some(ts(0)));
        let early = provider.positions(9590).await.unwrap().len();
        assert!(early < all);

        provider.set_cutoff(None);
        assert_eq!(provider.positions(9590).await.unwrap().len(), all);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_every_response() {
        let provider = ReplayProvider::new(sample_race()).with_latency(Duration::from_millis(250));

        let started = tokio::time::Instant::now();
        provider.drivers(9590).await.unwrap();
        provider.positions(9590).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn update_changes_served_data() {
        let provider = ReplayProvider::new(sample_race());
        assert_eq!(provider.sessions(&SessionQuery::races()).await.unwrap().len(), 2);

        provider.update(|data| {
            data.sessions.clear();
            data.by_session.remove(&9590);
        });
        assert!(provider.sessions(&SessionQuery::races()).await.unwrap().is_empty());
        assert!(provider.laps(9590, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn loads_fixture_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sessions.json"),
            r#"[{"session_key": 42, "session_name": "Race", "circuit_short_name": "Suzuka"}]"#,
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("42")).unwrap();
        std::fs::write(
            dir.path().join("42").join("drivers.json"),
            r#"[{"driver_number": 22, "full_name": "Yuki TSUNODA"}]"#,
        )
        .unwrap();

        let provider = ReplayProvider::open(dir.path()).unwrap();
        let sessions = provider.sessions(&SessionQuery::races()).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(provider.drivers(42).await.unwrap()[0].display_name(), "Yuki TSUNODA");
        assert!(provider.positions(42).await.unwrap().is_empty());
    }

    #[test]
    fn missing_fixture_directory_is_a_fixture_error() {
        let err = ReplayProvider::open("/definitely/not/here").unwrap_err();
        assert!(matches!(err, DashboardError::Fixture { .. }));
    }
}
