//! Standings reconciliation
//!
//! [`reconcile`] is a pure function of the previous snapshot and freshly
//! fetched data; [`StandingsAggregator`] wraps it with the concurrent fetch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use super::positions::{latest_positions, ranking};
use crate::Result;
use crate::provider::RaceDataProvider;
use crate::schema::{Driver, LapRecord, PositionSample};
use crate::types::{
    LapTimeMode, Leaderboard, LeaderboardEntry, PLACEHOLDER, format_optional_lap_time,
};

/// Raw arrays fetched for one refresh
#[derive(Debug, Clone, Default)]
pub struct RaceData {
    pub positions: Vec<PositionSample>,
    pub drivers: Vec<Driver>,
    pub laps: Vec<LapRecord>,
}

/// Build a new leaderboard from raw data and the previous snapshot.
///
/// `previous` is only consulted when it belongs to the same session; a driver
/// missing from it keeps its current position as `previous_position`.
/// Missing driver or lap data degrades to placeholders, never to an error.
pub fn reconcile(
    session_key: u32,
    mode: LapTimeMode,
    data: &RaceData,
    previous: Option<&Leaderboard>,
    generated_at: DateTime<Utc>,
) -> Leaderboard {
    let previous = previous.filter(|p| p.session_key == session_key);
    let previous_positions: HashMap<u32, u32> = previous
        .map(|p| p.iter().map(|e| (e.driver_number, e.position)).collect())
        .unwrap_or_default();

    let drivers: HashMap<u32, &Driver> =
        data.drivers.iter().filter_map(|d| d.driver_number.map(|n| (n, d))).collect();
    let lap_times = mode.reduce(&data.laps);

    let latest = latest_positions(&data.positions);
    let mut missing_drivers = 0usize;
    let mut missing_laps = 0usize;

    let entries: Vec<LeaderboardEntry> = ranking(&latest)
        .into_iter()
        .map(|(driver_number, position)| {
            let driver = drivers.get(&driver_number);
            if driver.is_none() {
                missing_drivers += 1;
                trace!("No driver record for #{}", driver_number);
            }

            let lap_time = lap_times.get(&driver_number).and_then(|lap| lap.lap_duration);
            if lap_time.is_none() {
                missing_laps += 1;
            }

            LeaderboardEntry {
                driver_number,
                position,
                previous_position: previous_positions
                    .get(&driver_number)
                    .copied()
                    .unwrap_or(position),
                driver_name: driver
                    .map(|d| d.display_name().to_string())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                team_name: driver
                    .map(|d| d.display_team().to_string())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                lap_time,
                lap_time_display: format_optional_lap_time(lap_time),
            }
        })
        .collect();

    debug!(
        session_key,
        ?mode,
        entries = entries.len(),
        missing_drivers,
        missing_laps,
        "Reconciled leaderboard"
    );

    Leaderboard { session_key, mode, generated_at, entries }
}

/// Fetches race data and reconciles it into leaderboards
pub struct StandingsAggregator<P: RaceDataProvider> {
    provider: Arc<P>,
}

impl<P: RaceDataProvider> Clone for StandingsAggregator<P> {
    fn clone(&self) -> Self {
        Self { provider: Arc::clone(&self.provider) }
    }
}

impl<P: RaceDataProvider> StandingsAggregator<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Produce the next leaderboard for a session.
    ///
    /// Positions, drivers and laps are fetched concurrently and awaited
    /// jointly. If any fetch fails the whole refresh fails and nothing is
    /// built, so a partial leaderboard can never be published.
    pub async fn refresh(
        &self,
        session_key: u32,
        is_live: bool,
        previous: Option<&Leaderboard>,
    ) -> Result<Leaderboard> {
        let mode = LapTimeMode::for_liveness(is_live);

        let (positions, drivers, laps) = tokio::try_join!(
            self.provider.positions(session_key),
            self.provider.drivers(session_key),
            self.provider.laps(session_key, None),
        )?;

        debug!(
            session_key,
            positions = positions.len(),
            drivers = drivers.len(),
            laps = laps.len(),
            "Fetched race data"
        );

        let data = RaceData { positions, drivers, laps };
        Ok(reconcile(session_key, mode, &data, previous, Utc::now()))
    }
}
