//! Lap-time selection for the standings table

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::laps::{best_lap_times, last_lap_times};
use crate::schema::LapRecord;

/// Which lap time the standings show per driver
///
/// While a session is live fans want current pace, so the last completed lap
/// is shown. Once it has ended, the best lap of the session is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum LapTimeMode {
    /// Minimum lap duration per driver
    Best,

    /// Highest lap number per driver
    Last,
}

impl LapTimeMode {
    /// Mode matching the session's liveness
    pub fn for_liveness(is_live: bool) -> Self {
        if is_live { LapTimeMode::Last } else { LapTimeMode::Best }
    }

    /// Check if this mode belongs to a live session
    pub fn is_live(self) -> bool {
        matches!(self, LapTimeMode::Last)
    }

    /// Column heading for the lap-time column
    pub fn column_title(self) -> &'static str {
        match self {
            LapTimeMode::Best => "Best Lap",
            LapTimeMode::Last => "Last Lap",
        }
    }

    /// Reduce raw lap records to one record per driver according to the mode
    pub fn reduce(self, records: &[LapRecord]) -> BTreeMap<u32, LapRecord> {
        match self {
            LapTimeMode::Best => best_lap_times(records),
            LapTimeMode::Last => last_lap_times(records),
        }
    }
}
