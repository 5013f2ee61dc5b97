//! Per-lap sector series for a single driver

use serde::{Deserialize, Serialize};

use crate::schema::LapRecord;

/// Sector durations of one lap, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SectorPoint {
    pub lap_number: u32,
    pub sector_1: f64,
    pub sector_2: f64,
    pub sector_3: f64,
    /// Timed lap duration, compared against [`total`](Self::total)
    pub lap_duration: Option<f64>,
}

impl SectorPoint {
    /// Sum of the three sectors
    pub fn total(&self) -> f64 {
        self.sector_1 + self.sector_2 + self.sector_3
    }

    /// Lap duration minus the sector sum, if the lap was timed
    pub fn unaccounted(&self) -> Option<f64> {
        self.lap_duration.map(|duration| duration - self.total())
    }
}

/// Laps that have all three sector times, ordered by lap number.
pub fn sector_series(laps: &[LapRecord]) -> Vec<SectorPoint> {
    let mut points: Vec<SectorPoint> = laps
        .iter()
        .filter_map(|lap| {
            let lap_number = lap.lap_number?;
            let [sector_1, sector_2, sector_3] = lap.sectors()?;
            Some(SectorPoint {
                lap_number,
                sector_1,
                sector_2,
                sector_3,
                lap_duration: lap.lap_duration,
            })
        })
        .collect();
    points.sort_by_key(|p| p.lap_number);
    points
}
