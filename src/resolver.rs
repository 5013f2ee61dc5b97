//! Session resolution
//!
//! Finds the race session to show and decides whether it is live. Upstream
//! ordering and filtering are never trusted; results are filtered again and
//! sorted here by end time.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use crate::DashboardError;
use crate::provider::{RaceDataProvider, SessionQuery};
use crate::schema::Session;

/// Resolves race sessions through a provider
pub struct SessionResolver<P: RaceDataProvider> {
    provider: Arc<P>,
}

impl<P: RaceDataProvider> Clone for SessionResolver<P> {
    fn clone(&self) -> Self {
        Self { provider: Arc::clone(&self.provider) }
    }
}

impl<P: RaceDataProvider> SessionResolver<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Latest race that has ended by today (or is in progress today).
    ///
    /// Returns `None` if there is no such race or the request fails; the
    /// reason is logged.
    pub async fn resolve_latest_session(&self) -> Option<Session> {
        self.resolve_latest_session_at(Utc::now()).await
    }

    /// [`resolve_latest_session`](Self::resolve_latest_session) as of `now`.
    pub async fn resolve_latest_session_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let query = SessionQuery::races_ended_by(now.date_naive());
        let mut sessions = match self.provider.sessions(&query).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("Failed to resolve latest session: {}", e);
                return None;
            }
        };

        retain_matching(&mut sessions, &query);
        sort_latest_first(&mut sessions);
        match sessions.into_iter().next() {
            Some(session) => {
                info!(
                    session_key = ?session.session_key,
                    "Resolved latest session: {}",
                    session.label()
                );
                Some(session)
            }
            None => {
                debug!("{}", DashboardError::empty_result("sessions"));
                None
            }
        }
    }

    /// Every race session, most recent first. Empty on failure.
    pub async fn available_races(&self) -> Vec<Session> {
        let query = SessionQuery::races();
        match self.provider.sessions(&query).await {
            Ok(mut sessions) => {
                retain_matching(&mut sessions, &query);
                sort_latest_first(&mut sessions);
                debug!(races = sessions.len(), "Listed available races");
                sessions
            }
            Err(e) => {
                warn!("Failed to list races: {}", e);
                Vec::new()
            }
        }
    }
}

/// Whether `session` is in progress at `now`.
pub fn is_live(session: &Session, now: DateTime<Utc>) -> bool {
    session.is_live_at(now)
}

fn retain_matching(sessions: &mut Vec<Session>, query: &SessionQuery) {
    let before = sessions.len();
    sessions.retain(|s| query.matches(s));
    if sessions.len() < before {
        trace!(dropped = before - sessions.len(), "Dropped sessions the upstream did not filter");
    }
}

/// Sort descending by end time; sessions without an end date go last.
fn sort_latest_first(sessions: &mut [Session]) {
    sessions.sort_by_key(|s| Reverse(s.date_end));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ReplayData, ReplayProvider};
    use crate::test_utils::{
        OLDER_SESSION_KEY, SAMPLE_SESSION_KEY, ScriptedProvider, sample_race, ts,
    };

    #[tokio::test]
    async fn picks_most_recent_race_regardless_of_upstream_order() {
        let mut data = sample_race();
        data.sessions.reverse();
        let resolver = SessionResolver::new(Arc::new(ReplayProvider::new(data)));

        let session = resolver.resolve_latest_session_at(ts(3600)).await.unwrap();
        assert_eq!(session.session_key, Some(SAMPLE_SESSION_KEY));
    }

    #[tokio::test]
    async fn ignores_races_ending_after_today() {
        let resolver = SessionResolver::new(Arc::new(ReplayProvider::new(sample_race())));

        // A day before the sample race only the older one has ended
        let session = resolver.resolve_latest_session_at(ts(-86_400)).await.unwrap();
        assert_eq!(session.session_key, Some(OLDER_SESSION_KEY));
    }

    #[tokio::test]
    async fn unfiltered_upstream_cannot_select_a_future_race() {
        let provider = Arc::new(ScriptedProvider::new(sample_race()));
        provider.ignore_session_filters();
        let mut qualifying = crate::test_utils::sample_session();
        qualifying.session_key = Some(9589);
        qualifying.session_name = Some("Qualifying".to_string());
        provider.replay().update(|data| data.sessions.push(qualifying));
        let resolver = SessionResolver::new(provider);

        let session = resolver.resolve_latest_session_at(ts(-86_400)).await.unwrap();
        assert_eq!(session.session_key, Some(OLDER_SESSION_KEY));

        let keys: Vec<_> =
            resolver.available_races().await.iter().map(|s| s.session_key).collect();
        assert_eq!(keys, vec![Some(SAMPLE_SESSION_KEY), Some(OLDER_SESSION_KEY)]);
    }

    #[tokio::test]
    async fn no_sessions_resolves_to_none() {
        let resolver = SessionResolver::new(Arc::new(ReplayProvider::new(ReplayData::default())));
        assert!(resolver.resolve_latest_session_at(ts(0)).await.is_none());
        assert!(resolver.available_races().await.is_empty());
    }

    #[tokio::test]
    async fn request_failure_resolves_to_none() {
        let provider = Arc::new(ScriptedProvider::new(sample_race()));
        provider.fail_next("sessions", DashboardError::network("/sessions", "dns"));
        let resolver = SessionResolver::new(Arc::clone(&provider));

        assert!(resolver.resolve_latest_session_at(ts(0)).await.is_none());
        assert_eq!(provider.calls("sessions"), 1);
    }

    #[tokio::test]
    async fn available_races_are_most_recent_first() {
        let resolver = SessionResolver::new(Arc::new(ReplayProvider::new(sample_race())));
        let keys: Vec<_> =
            resolver.available_races().await.iter().map(|s| s.session_key).collect();
        assert_eq!(keys, vec![Some(SAMPLE_SESSION_KEY), Some(OLDER_SESSION_KEY)]);
    }

    #[test]
    fn liveness_window_is_inclusive() {
        let session = crate::test_utils::sample_session();
        assert!(is_live(&session, ts(0)));
        assert!(is_live(&session, ts(7200)));
        assert!(!is_live(&session, ts(7201)));
        assert!(!is_live(&Session::default(), ts(0)));
    }
}
