//! Session records
//!
//! A session is one on-track event (practice, qualifying, race) identified by
//! its `session_key`. The dashboard only ever selects race sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::json_utils::{lenient_timestamp, lenient_u32};
use crate::types::format::PLACEHOLDER;

/// Session name the upstream uses for Grand Prix races.
pub const RACE_SESSION_NAME: &str = "Race";

/// A session as returned by `GET /sessions`
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Session {
    /// Unique session identifier
    #[serde(deserialize_with = "lenient_u32")]
    pub session_key: Option<u32>,
    /// Meeting (race weekend) identifier
    #[serde(deserialize_with = "lenient_u32")]
    pub meeting_key: Option<u32>,
    /// Session kind, e.g. "Race", "Qualifying"
    pub session_name: Option<String>,
    /// Short circuit name, e.g. "Monza"
    pub circuit_short_name: Option<String>,
    /// Country hosting the meeting
    pub country_name: Option<String>,
    /// Championship year
    pub year: Option<i32>,
    /// Scheduled start (UTC)
    #[serde(deserialize_with = "lenient_timestamp")]
    pub date_start: Option<DateTime<Utc>>,
    /// Scheduled end (UTC)
    #[serde(deserialize_with = "lenient_timestamp")]
    pub date_end: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a race session from its essential fields.
    pub fn race(
        session_key: u32,
        circuit_short_name: impl Into<String>,
        date_start: DateTime<Utc>,
        date_end: DateTime<Utc>,
    ) -> Self {
        Self {
            session_key: Some(session_key),
            session_name: Some(RACE_SESSION_NAME.to_string()),
            circuit_short_name: Some(circuit_short_name.into()),
            date_start: Some(date_start),
            date_end: Some(date_end),
            ..Default::default()
        }
    }

    /// Whether `now` falls inside `[date_start, date_end]`.
    ///
    /// A session missing either bound is never live.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        match (self.date_start, self.date_end) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }

    /// Whether the session is live right now.
    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }

    /// Whether this session is a race.
    pub fn is_race(&self) -> bool {
        self.session_name.as_deref() == Some(RACE_SESSION_NAME)
    }

    /// Race selector label: `"Monza - 01/09/2024"`.
    pub fn label(&self) -> String {
        let circuit = self.circuit_short_name.as_deref().unwrap_or(PLACEHOLDER);
        let date = self
            .date_start
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        format!("{} - {}", circuit, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn monza() -> Session {
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 13, 0, 0).unwrap();
        Session::race(9590, "Monza", start, start + Duration::hours(2))
    }

    #[test]
    fn liveness_window_is_inclusive() {
        let session = monza();
        let start = session.date_start.unwrap();
        let end = session.date_end.unwrap();

        assert!(session.is_live_at(start));
        assert!(session.is_live_at(end));
        assert!(session.is_live_at(start + Duration::minutes(45)));
        assert!(!session.is_live_at(start - Duration::seconds(1)));
        assert!(!session.is_live_at(end + Duration::seconds(1)));
    }

    #[test]
    fn sessions_without_dates_are_never_live() {
        let mut session = monza();
        session.date_end = None;
        assert!(!session.is_live_at(session.date_start.unwrap()));
    }

    #[test]
    fn label_uses_day_month_year() {
        assert_eq!(monza().label(), "Monza - 01/09/2024");
        assert_eq!(Session::default().label(), "N/A - N/A");
    }

    #[test]
    fn decodes_upstream_payload() {
        let json = r#"{
            "session_key": 9590,
            "session_name": "Race",
            "circuit_short_name": "Monza",
            "date_start": "2024-09-01T13:00:00+00:00",
            "date_end": "2024-09-01T15:00:00+00:00",
            "gmt_offset": "02:00:00",
            "year": 2024
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session, monza_with_year());
        assert!(session.is_race());
    }

    fn monza_with_year() -> Session {
        Session { year: Some(2024), ..monza() }
    }
}
