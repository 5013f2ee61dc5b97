//! Leaderboard snapshots
//!
//! A [`Leaderboard`] is immutable once built. Each refresh produces a fresh
//! one; the previous snapshot of the same session is only consulted for
//! `previous_position`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format::PositionChange;
use super::lap_mode::LapTimeMode;

/// One row of the standings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LeaderboardEntry {
    pub driver_number: u32,
    /// Current position, 1-based
    pub position: u32,
    /// Position in the previous snapshot, or `position` if the driver is new
    pub previous_position: u32,
    /// Full name or `N/A`
    pub driver_name: String,
    /// Team name or `N/A`
    pub team_name: String,
    /// Lap duration in seconds (best or last depending on the mode)
    pub lap_time: Option<f64>,
    /// Formatted lap time or `N/A`
    pub lap_time_display: String,
}

impl LeaderboardEntry {
    /// `previous_position - position`; positive means places gained.
    pub fn position_change(&self) -> i64 {
        i64::from(self.previous_position) - i64::from(self.position)
    }

    /// Change indicator for display
    pub fn change(&self) -> PositionChange {
        PositionChange::from_delta(self.position_change())
    }
}

/// Ranked, change-annotated standings for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Leaderboard {
    pub session_key: u32,
    pub mode: LapTimeMode,
    pub generated_at: DateTime<Utc>,
    /// Sorted ascending by position, one entry per driver
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LeaderboardEntry> {
        self.entries.iter()
    }

    /// Entry for a driver, if present
    pub fn entry(&self, driver_number: u32) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.driver_number == driver_number)
    }

    /// Current position of a driver, if present
    pub fn position_of(&self, driver_number: u32) -> Option<u32> {
        self.entry(driver_number).map(|e| e.position)
    }

    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    /// Whether two snapshots show the same table, ignoring when they were built.
    pub fn same_standings(&self, other: &Leaderboard) -> bool {
        self.session_key == other.session_key
            && self.mode == other.mode
            && self.entries == other.entries
    }
}

impl<'a> IntoIterator for &'a Leaderboard {
    type Item = &'a LeaderboardEntry;
    type IntoIter = std::slice::Iter<'a, LeaderboardEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
