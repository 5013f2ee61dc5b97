//! Provider trait for race data sources

use chrono::NaiveDate;

use crate::Result;
use crate::schema::{Driver, LapRecord, PositionSample, Session, TyreStint};

/// Filter for the sessions endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQuery {
    /// Exact session name, e.g. "Race"
    pub session_name: Option<String>,
    /// Only sessions whose `date_end` is on or before this day
    pub ended_on_or_before: Option<NaiveDate>,
}

impl SessionQuery {
    /// All race sessions
    pub fn races() -> Self {
        Self { session_name: Some(crate::schema::session::RACE_SESSION_NAME.to_string()), ..Default::default() }
    }

    /// Race sessions ending on or before `day`
    pub fn races_ended_by(day: NaiveDate) -> Self {
        Self { ended_on_or_before: Some(day), ..Self::races() }
    }

    /// Whether a session satisfies this query
    ///
    /// Used by in-memory providers; the HTTP provider lets the upstream filter.
    pub fn matches(&self, session: &Session) -> bool {
        if let Some(name) = &self.session_name {
            if session.session_name.as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        if let Some(day) = self.ended_on_or_before {
            match session.date_end {
                Some(end) if end.date_naive() <= day => {}
                _ => return false,
            }
        }
        true
    }
}

/// Trait for race data sources
///
/// Providers abstract over the live OpenF1 API and recorded fixtures. Every
/// method returns the raw, unreduced array for its endpoint; aggregation is
/// the caller's job. Implementations must not reorder or deduplicate records.
#[async_trait::async_trait]
pub trait RaceDataProvider: Send + Sync + 'static {
    /// `GET /sessions`
    async fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>>;

    /// `GET /drivers?session_key={id}`
    async fn drivers(&self, session_key: u32) -> Result<Vec<Driver>>;

    /// `GET /position?session_key={id}`
    async fn positions(&self, session_key: u32) -> Result<Vec<PositionSample>>;

    /// `GET /laps?session_key={id}[&driver_number={n}]`
    async fn laps(&self, session_key: u32, driver_number: Option<u32>) -> Result<Vec<LapRecord>>;

    /// `GET /stints?session_key={id}&driver_number={n}`
    async fn stints(&self, session_key: u32, driver_number: u32) -> Result<Vec<TyreStint>>;
}
