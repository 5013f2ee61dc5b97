//! Position samples
//!
//! `/position` is an append-only log: every overtake emits a new sample for
//! each driver involved. Only the latest sample per driver is authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::json_utils::{lenient_timestamp, lenient_u32};

/// A position sample from `GET /position`
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct PositionSample {
    /// When the position was recorded
    #[serde(deserialize_with = "lenient_timestamp")]
    pub date: Option<DateTime<Utc>>,
    /// Driver the sample belongs to
    #[serde(deserialize_with = "lenient_u32")]
    pub driver_number: Option<u32>,
    /// Race position, 1-based
    #[serde(deserialize_with = "lenient_u32")]
    pub position: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub session_key: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub meeting_key: Option<u32>,
}

impl PositionSample {
    pub fn new(driver_number: u32, position: u32, date: DateTime<Utc>) -> Self {
        Self {
            date: Some(date),
            driver_number: Some(driver_number),
            position: Some(position),
            ..Default::default()
        }
    }
}
