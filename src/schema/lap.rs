//! Lap records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::json_utils::{lenient_f64, lenient_timestamp, lenient_u32};

/// A completed (or in-progress) lap from `GET /laps`
///
/// Durations are in seconds. The upstream leaves `lap_duration` null for
/// out-laps, laps under red flag, and the lap currently being driven.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct LapRecord {
    #[serde(deserialize_with = "lenient_u32")]
    pub driver_number: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub lap_number: Option<u32>,
    #[serde(deserialize_with = "lenient_f64")]
    pub lap_duration: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub duration_sector_1: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub duration_sector_2: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub duration_sector_3: Option<f64>,
    /// When the lap started
    #[serde(deserialize_with = "lenient_timestamp")]
    pub date_start: Option<DateTime<Utc>>,
}

impl LapRecord {
    pub fn new(driver_number: u32, lap_number: u32, lap_duration: Option<f64>) -> Self {
        Self {
            driver_number: Some(driver_number),
            lap_number: Some(lap_number),
            lap_duration,
            ..Default::default()
        }
    }

    /// Attach sector durations.
    pub fn with_sectors(mut self, s1: f64, s2: f64, s3: f64) -> Self {
        self.duration_sector_1 = Some(s1);
        self.duration_sector_2 = Some(s2);
        self.duration_sector_3 = Some(s3);
        self
    }

    /// All three sector durations, if every one of them is present.
    pub fn sectors(&self) -> Option<[f64; 3]> {
        Some([self.duration_sector_1?, self.duration_sector_2?, self.duration_sector_3?])
    }
}
