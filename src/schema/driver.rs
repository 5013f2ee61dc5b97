//! Driver records

use serde::{Deserialize, Serialize};

use crate::json_utils::lenient_u32;
use crate::types::format::PLACEHOLDER;

/// A driver entry from `GET /drivers`
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Driver {
    /// Car number, unique per session
    #[serde(deserialize_with = "lenient_u32")]
    pub driver_number: Option<u32>,
    /// Full name, e.g. "Max VERSTAPPEN"
    pub full_name: Option<String>,
    /// Three-letter acronym, e.g. "VER"
    pub name_acronym: Option<String>,
    /// Team name
    pub team_name: Option<String>,
    /// Team colour as a hex string without `#`
    pub team_colour: Option<String>,
}

impl Driver {
    /// Build a driver from its essential fields.
    pub fn new(driver_number: u32, full_name: impl Into<String>, team_name: impl Into<String>) -> Self {
        Self {
            driver_number: Some(driver_number),
            full_name: Some(full_name.into()),
            team_name: Some(team_name.into()),
            ..Default::default()
        }
    }

    /// Full name or the `N/A` placeholder.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Team name or the `N/A` placeholder.
    pub fn display_team(&self) -> &str {
        self.team_name.as_deref().unwrap_or(PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_names_fall_back_to_placeholder() {
        let driver: Driver = serde_json::from_str(r#"{"driver_number": 44}"#).unwrap();
        assert_eq!(driver.driver_number, Some(44));
        assert_eq!(driver.display_name(), "N/A");
        assert_eq!(driver.display_team(), "N/A");
    }

    #[test]
    fn decodes_upstream_payload() {
        let json = r#"{
            "driver_number": 1,
            "full_name": "Max VERSTAPPEN",
            "name_acronym": "VER",
            "team_name": "Red Bull Racing",
            "team_colour": "3671C6",
            "country_code": "NED"
        }"#;
        let driver: Driver = serde_json::from_str(json).unwrap();
        assert_eq!(driver.display_name(), "Max VERSTAPPEN");
        assert_eq!(driver.display_team(), "Red Bull Racing");
        assert_eq!(driver.team_colour.as_deref(), Some("3671C6"));
    }
}
