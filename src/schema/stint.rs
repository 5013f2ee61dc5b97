//! Tyre stints
//!
//! A stint is a continuous run on one set of tyres between pit stops.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::json_utils::lenient_u32;

/// Tyre compound reported by `/stints`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum TyreCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    /// Anything else the upstream reports (e.g. "TEST_UNKNOWN")
    Other(String),
}

impl TyreCompound {
    /// Parse the upstream's upper-case compound name.
    pub fn from_api(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SOFT" => TyreCompound::Soft,
            "MEDIUM" => TyreCompound::Medium,
            "HARD" => TyreCompound::Hard,
            "INTERMEDIATE" => TyreCompound::Intermediate,
            "WET" => TyreCompound::Wet,
            _ => TyreCompound::Other(raw.trim().to_string()),
        }
    }

    /// Upper-case name as used by the upstream.
    pub fn as_str(&self) -> &str {
        match self {
            TyreCompound::Soft => "SOFT",
            TyreCompound::Medium => "MEDIUM",
            TyreCompound::Hard => "HARD",
            TyreCompound::Intermediate => "INTERMEDIATE",
            TyreCompound::Wet => "WET",
            TyreCompound::Other(name) => name,
        }
    }
}

impl fmt::Display for TyreCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stint from `GET /stints`
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct TyreStint {
    pub compound: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub driver_number: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub lap_start: Option<u32>,
    /// Null while the stint is still running
    #[serde(deserialize_with = "lenient_u32")]
    pub lap_end: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub stint_number: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub tyre_age_at_start: Option<u32>,
}

impl TyreStint {
    pub fn new(driver_number: u32, compound: &str, lap_start: u32, lap_end: u32) -> Self {
        Self {
            compound: Some(compound.to_string()),
            driver_number: Some(driver_number),
            lap_start: Some(lap_start),
            lap_end: Some(lap_end),
            ..Default::default()
        }
    }

    /// Parsed compound, if reported.
    pub fn tyre_compound(&self) -> Option<TyreCompound> {
        self.compound.as_deref().filter(|c| !c.trim().is_empty()).map(TyreCompound::from_api)
    }

    /// Laps covered, both bounds inclusive. `None` for open, inverted or
    /// unrepresentable stints.
    pub fn laps(&self) -> Option<u32> {
        let (start, end) = (self.lap_start?, self.lap_end?);
        end.checked_sub(start)?.checked_add(1)
    }
}
