//! Consumer-facing dashboard handle

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::aggregate::{CompoundUsage, SectorPoint, sector_series, tyre_usage};
use crate::config::DashboardConfig;
use crate::provider::RaceDataProvider;
use crate::resolver::SessionResolver;
use crate::scheduler::{FeedState, Generation, RefreshScheduler};
use crate::schema::Session;
use crate::stream::DistinctExt;
use crate::types::Leaderboard;
use crate::{DashboardError, Result};

/// Tyre and sector breakdown for one driver in the selected session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DriverView {
    pub session_key: u32,
    pub driver_number: u32,
    /// Laps per compound, in the order the compounds were first used
    pub tyre_usage: Vec<CompoundUsage>,
    /// Complete sector splits, sorted by lap number
    pub sector_series: Vec<SectorPoint>,
}

/// Live race dashboard over a [`RaceDataProvider`]
pub struct Dashboard<P: RaceDataProvider> {
    provider: Arc<P>,
    resolver: SessionResolver<P>,
    scheduler: RefreshScheduler<P>,

    /// Race selector entries, most recent first
    races: RwLock<Vec<Session>>,

    /// Selected session
    selected: watch::Sender<Option<Arc<Session>>>,

    /// Scheduler state receiver
    state: watch::Receiver<FeedState>,
}

impl<P: RaceDataProvider> Dashboard<P> {
    /// Load the race list, select the latest race and start refreshing it.
    ///
    /// Having no race to show is not an error; the dashboard then stays idle
    /// until [`select_session`](Self::select_session) is called.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] if `config` is invalid.
    pub async fn start(provider: Arc<P>, config: &DashboardConfig) -> Result<Self> {
        Self::start_at(provider, config, Utc::now()).await
    }

    /// [`start`](Self::start) with an explicit clock.
    pub async fn start_at(
        provider: Arc<P>,
        config: &DashboardConfig,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;

        let resolver = SessionResolver::new(Arc::clone(&provider));
        let scheduler = RefreshScheduler::new(Arc::clone(&provider), config.poll_interval());
        let state = scheduler.state();

        let (mut races, latest) =
            tokio::join!(resolver.available_races(), resolver.resolve_latest_session_at(now));

        if let Some(session) = &latest {
            if !races.iter().any(|r| r.session_key == session.session_key) {
                races.insert(0, session.clone());
            }
        }

        let (selected, _) = watch::channel(None);
        let dashboard = Self {
            provider,
            resolver,
            scheduler,
            races: RwLock::new(races),
            selected,
            state,
        };

        match latest {
            Some(session) => dashboard.activate(session, now),
            None => info!("No race session available, dashboard idle"),
        }

        Ok(dashboard)
    }

    /// Select a race from [`sessions`](Self::sessions) and refresh it.
    ///
    /// An unknown key stops refreshing and clears the leaderboard.
    pub fn select_session(&self, session_key: u32) -> Option<Arc<Session>> {
        self.select_session_at(session_key, Utc::now())
    }

    /// [`select_session`](Self::select_session) with an explicit clock.
    pub fn select_session_at(&self, session_key: u32, now: DateTime<Utc>) -> Option<Arc<Session>> {
        let session = self
            .races
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.session_key == Some(session_key))
            .cloned();

        match session {
            Some(session) => {
                self.activate(session, now);
                self.selected_session()
            }
            None => {
                warn!(session_key, "Unknown session selected");
                self.stop();
                None
            }
        }
    }

    /// Re-evaluate liveness of the selected session at `now`.
    ///
    /// Restarts refreshing in the other lap-time mode if the session went live
    /// or finished. Returns whether liveness changed.
    pub fn refresh_liveness(&self, now: DateTime<Utc>) -> bool {
        let Some(session) = self.selected_session() else {
            return false;
        };

        let live = session.is_live_at(now);
        if live == self.is_live() {
            return false;
        }

        info!(session_key = ?session.session_key, live, "Session liveness changed");
        self.activate(session.as_ref().clone(), now);
        true
    }

    /// Stop refreshing and deselect the session.
    pub fn stop(&self) {
        self.scheduler.deactivate();
        self.selected.send_replace(None);
    }

    /// Re-fetch the race selector list.
    pub async fn reload_sessions(&self) -> Vec<Session> {
        let races = self.resolver.available_races().await;
        *self.races.write().unwrap_or_else(PoisonError::into_inner) = races.clone();
        races
    }

    /// Tyre usage and sector splits of one driver in the selected session.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::EmptyResult`] if no session is selected, or
    /// the provider's error if either fetch fails.
    pub async fn driver_view(&self, driver_number: u32) -> Result<DriverView> {
        let session_key = self
            .selected_session()
            .and_then(|s| s.session_key)
            .ok_or_else(|| DashboardError::empty_result("selected session"))?;

        let (stints, laps) = tokio::try_join!(
            self.provider.stints(session_key, driver_number),
            self.provider.laps(session_key, Some(driver_number)),
        )?;

        debug!(session_key, driver_number, stints = stints.len(), laps = laps.len(), "Built driver view");

        Ok(DriverView {
            session_key,
            driver_number,
            tyre_usage: tyre_usage(&stints),
            sector_series: sector_series(&laps),
        })
    }

    /// Latest published leaderboard, if any
    pub fn current_leaderboard(&self) -> Option<Arc<Leaderboard>> {
        self.state.borrow().leaderboard.clone()
    }

    /// Leaderboard snapshots as they change
    ///
    /// Yields the current snapshot immediately if there is one. Refreshes that
    /// produce the same standings are not repeated.
    pub fn leaderboard_updates(&self) -> impl Stream<Item = Arc<Leaderboard>> + 'static {
        WatchStream::new(self.state.clone())
            .filter_map(|state| async move { state.leaderboard })
            .distinct_by(|a, b| a.same_standings(b))
    }

    /// Every scheduler state change, starting with the current state
    pub fn state_updates(&self) -> impl Stream<Item = FeedState> + 'static {
        WatchStream::new(self.state.clone())
    }

    /// Selected session changes, starting with the current selection
    pub fn session_updates(&self) -> impl Stream<Item = Arc<Session>> + 'static {
        WatchStream::new(self.selected.subscribe()).filter_map(|opt| async move { opt })
    }

    pub fn current_state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn generation(&self) -> Generation {
        self.state.borrow().generation
    }

    pub fn selected_session(&self) -> Option<Arc<Session>> {
        self.selected.borrow().clone()
    }

    /// Whether the selected session is being refreshed as live
    pub fn is_live(&self) -> bool {
        self.state.borrow().is_live
    }

    /// Race selector entries, most recent first
    pub fn sessions(&self) -> Vec<Session> {
        self.races.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn activate(&self, session: Session, now: DateTime<Utc>) {
        let Some(session_key) = session.session_key else {
            warn!("Session without key cannot be refreshed");
            self.stop();
            return;
        };

        let live = session.is_live_at(now);
        info!(session_key, live, "Selected {}", session.label());
        self.selected.send_replace(Some(Arc::new(session)));
        self.scheduler.activate(session_key, live);
    }
}
