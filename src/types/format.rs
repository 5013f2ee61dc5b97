//! Display formatting for timing values

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shown wherever a value is missing or a join found no match.
pub const PLACEHOLDER: &str = "N/A";

/// Format a lap duration in seconds the way timing screens do.
///
/// Under a minute the seconds are zero-padded to two digits (`"58.100"`),
/// otherwise minutes are prefixed (`"1:02.345"`). The value is rounded to the
/// millisecond before splitting so `59.9996` becomes `"1:00.000"`, never
/// `"60.000"`. Negative and non-finite durations yield [`PLACEHOLDER`].
pub fn format_lap_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return PLACEHOLDER.to_string();
    }

    let total_ms = (seconds * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    if minutes > 0 {
        format!("{}:{:02}.{:03}", minutes, secs, millis)
    } else {
        format!("{:02}.{:03}", secs, millis)
    }
}

/// [`format_lap_time`] for an optional duration.
pub fn format_optional_lap_time(seconds: Option<f64>) -> String {
    seconds.map(format_lap_time).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Direction and size of a position change between two leaderboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PositionChange {
    /// Gained places
    Improved(u32),
    /// Lost places
    Dropped(u32),
    Unchanged,
}

impl PositionChange {
    /// Build from `previous - current` (positive means places gained).
    pub fn from_delta(delta: i64) -> Self {
        match delta {
            0 => PositionChange::Unchanged,
            d if d > 0 => PositionChange::Improved(d.unsigned_abs() as u32),
            d => PositionChange::Dropped(d.unsigned_abs() as u32),
        }
    }

    pub fn is_improved(self) -> bool {
        matches!(self, PositionChange::Improved(_))
    }
}

impl fmt::Display for PositionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionChange::Improved(n) => write!(f, "▲ {}", n),
            PositionChange::Dropped(n) => write!(f, "▼ {}", n),
            PositionChange::Unchanged => f.write_str("-"),
        }
    }
}
