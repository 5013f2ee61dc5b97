//! Derived view-model types.
//!
//! Everything in this module is computed from the wire records in
//! [`crate::schema`] and handed to the UI as immutable values:
//! - [`Leaderboard`] / [`LeaderboardEntry`] are the standings snapshots
//! - [`LapTimeMode`] selects best or last lap per driver
//! - [`PositionChange`] and [`format_lap_time`] produce display strings

pub mod format;
mod lap_mode;
mod leaderboard;

pub use format::{PLACEHOLDER, PositionChange, format_lap_time, format_optional_lap_time};
pub use lap_mode::LapTimeMode;
pub use leaderboard::{Leaderboard, LeaderboardEntry};
