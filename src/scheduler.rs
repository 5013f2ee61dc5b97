//! Refresh scheduling with generation-based cancellation
//!
//! The [`RefreshScheduler`] owns at most one poll task. Every activation
//! starts a new [`Generation`]; a task only publishes while its captured
//! generation is still the current one, so a fetch that outlives a session
//! change or a deactivation can never overwrite newer state.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::StandingsAggregator;
use crate::provider::RaceDataProvider;
use crate::types::Leaderboard;

/// One activation of the scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generation {
    /// Session being polled, `None` when inactive
    pub session_key: Option<u32>,
    /// Incremented on every activation and deactivation
    pub epoch: u64,
}

/// Progress of the current generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing selected
    #[default]
    Idle,
    /// Activated, first refresh not finished yet
    Loading,
    /// Last refresh succeeded
    Ready,
    /// Last `consecutive` refreshes failed; the previous snapshot is kept
    Failed { consecutive: u32 },
}

/// Published scheduler state
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub generation: Generation,
    pub is_live: bool,
    pub status: FeedStatus,
    pub leaderboard: Option<Arc<Leaderboard>>,
}

/// Owns the poll timer and the published [`FeedState`]
pub struct RefreshScheduler<P: RaceDataProvider> {
    aggregator: StandingsAggregator<P>,
    interval: Duration,
    state: Arc<watch::Sender<FeedState>>,
    cancel: Mutex<CancellationToken>,
}

impl<P: RaceDataProvider> RefreshScheduler<P> {
    /// Create an idle scheduler polling live sessions every `interval`.
    pub fn new(provider: Arc<P>, interval: Duration) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            aggregator: StandingsAggregator::new(provider),
            interval,
            state: Arc::new(state),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn generation(&self) -> Generation {
        self.state.borrow().generation
    }

    /// Start polling `session_key`, replacing any running cycle.
    ///
    /// One refresh runs immediately; live sessions then refresh every
    /// interval. Must be called within a tokio runtime.
    pub fn activate(&self, session_key: u32, is_live: bool) -> Generation {
        let mut current = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        let cancel = CancellationToken::new();
        *current = cancel.clone();

        let mut generation = Generation::default();
        let mut baseline = None;
        self.state.send_modify(|state| {
            if state.generation.session_key != Some(session_key) {
                state.leaderboard = None;
            }
            generation = Generation { session_key: Some(session_key), epoch: state.generation.epoch + 1 };
            state.generation = generation;
            state.is_live = is_live;
            state.status = FeedStatus::Loading;
            baseline = state.leaderboard.clone();
        });

        info!(session_key, epoch = generation.epoch, is_live, "Activated refresh cycle");

        let task = PollTask {
            aggregator: self.aggregator.clone(),
            state: Arc::clone(&self.state),
            generation,
            session_key,
            is_live,
            interval: self.interval,
            cancel,
        };
        tokio::spawn(task.run(baseline));

        generation
    }

    /// Stop polling and clear the snapshot. Calling it again is a no-op.
    pub fn deactivate(&self) {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner).cancel();

        self.state.send_if_modified(|state| {
            if state.generation.session_key.is_none() {
                return false;
            }
            state.generation = Generation { session_key: None, epoch: state.generation.epoch + 1 };
            state.is_live = false;
            state.status = FeedStatus::Idle;
            state.leaderboard = None;
            info!(epoch = state.generation.epoch, "Deactivated refresh cycle");
            true
        });
    }
}

impl<P: RaceDataProvider> Drop for RefreshScheduler<P> {
    fn drop(&mut self) {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner).cancel();
    }
}

struct PollTask<P: RaceDataProvider> {
    aggregator: StandingsAggregator<P>,
    state: Arc<watch::Sender<FeedState>>,
    generation: Generation,
    session_key: u32,
    is_live: bool,
    interval: Duration,
    cancel: CancellationToken,
}

impl<P: RaceDataProvider> PollTask<P> {
    async fn run(self, mut previous: Option<Arc<Leaderboard>>) {
        debug!(session_key = self.session_key, epoch = self.generation.epoch, "Poll task started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.aggregator.refresh(self.session_key, self.is_live, previous.as_deref()) => result,
            };

            match result {
                Ok(board) => {
                    consecutive = 0;
                    let board = Arc::new(board);
                    let applied = self.publish(|state| {
                        state.status = FeedStatus::Ready;
                        state.leaderboard = Some(Arc::clone(&board));
                    });
                    if !applied {
                        debug!(epoch = self.generation.epoch, "Discarded result of superseded generation");
                        break;
                    }
                    debug!(session_key = self.session_key, entries = board.len(), "Published leaderboard");
                    previous = Some(board);
                }
                Err(e) => {
                    consecutive += 1;
                    warn!(
                        session_key = self.session_key,
                        consecutive,
                        retryable = e.is_retryable(),
                        "Refresh failed: {}",
                        e
                    );
                    if !self.publish(|state| state.status = FeedStatus::Failed { consecutive }) {
                        break;
                    }
                }
            }

            if !self.is_live {
                break;
            }
        }

        debug!(session_key = self.session_key, epoch = self.generation.epoch, "Poll task ended");
    }

    /// Apply `f` only if this task's generation is still current.
    fn publish<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut FeedState),
    {
        self.state.send_if_modified(|state| {
            if state.generation != self.generation {
                return false;
            }
            f(state);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DashboardError;
    use crate::test_utils::{OLDER_SESSION_KEY, SAMPLE_SESSION_KEY, ScriptedProvider, sample_race, ts};
    use crate::types::{LapTimeMode, PositionChange};

    const INTERVAL: Duration = Duration::from_secs(5);

    fn scheduler() -> (Arc<ScriptedProvider>, RefreshScheduler<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(sample_race()));
        let scheduler = RefreshScheduler::new(Arc::clone(&provider), INTERVAL);
        (provider, scheduler)
    }

    async fn ready(rx: &mut watch::Receiver<FeedState>, epoch: u64) -> FeedState {
        rx.wait_for(|s| s.generation.epoch == epoch && s.status == FeedStatus::Ready)
            .await
            .unwrap()
            .clone()
    }

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    #[tokio::test(start_paused = true)]
    async fn non_live_session_refreshes_once() {
        let (provider, scheduler) = scheduler();
        let mut rx = scheduler.state();

        let generation = scheduler.activate(SAMPLE_SESSION_KEY, false);
        let state = ready(&mut rx, generation.epoch).await;

        let board = state.leaderboard.unwrap();
        assert_eq!(board.mode, LapTimeMode::Best);
        assert_eq!(board.len(), 3);

        advance(INTERVAL * 4).await;
        assert_eq!(provider.calls("positions"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn live_session_polls_every_interval() {
        let (provider, scheduler) = scheduler();
        let mut rx = scheduler.state();

        let generation = scheduler.activate(SAMPLE_SESSION_KEY, true);
        let state = ready(&mut rx, generation.epoch).await;
        assert_eq!(state.leaderboard.unwrap().mode, LapTimeMode::Last);
        assert_eq!(provider.calls("positions"), 1);

        advance(INTERVAL + Duration::from_millis(1)).await;
        assert_eq!(provider.calls("positions"), 2);

        advance(INTERVAL).await;
        assert_eq!(provider.calls("positions"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reactivation_does_not_stack_timers() {
        let (provider, scheduler) = scheduler();

        scheduler.activate(SAMPLE_SESSION_KEY, true);
        let generation = scheduler.activate(SAMPLE_SESSION_KEY, true);
        assert_eq!(generation.epoch, 2);

        advance(INTERVAL + Duration::from_millis(1)).await;
        // One immediate refresh plus one tick from the surviving task
        assert_eq!(provider.calls("positions"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_after_deactivate_is_discarded() {
        let (provider, scheduler) = scheduler();
        let gate = provider.hold("laps");

        scheduler.activate(SAMPLE_SESSION_KEY, true);
        while provider.calls("laps") == 0 {
            tokio::task::yield_now().await;
        }

        scheduler.deactivate();
        scheduler.deactivate();
        gate.open();
        advance(INTERVAL * 2).await;

        let state = scheduler.current();
        assert_eq!(state.status, FeedStatus::Idle);
        assert!(state.leaderboard.is_none());
        assert_eq!(state.generation, Generation { session_key: None, epoch: 2 });
        assert_eq!(provider.calls("laps"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn session_switch_drops_stale_result() {
        let (provider, scheduler) = scheduler();
        let mut rx = scheduler.state();
        let gate = provider.hold("laps");

        scheduler.activate(SAMPLE_SESSION_KEY, true);
        while provider.calls("laps") == 0 {
            tokio::task::yield_now().await;
        }

        let generation = scheduler.activate(OLDER_SESSION_KEY, false);
        gate.open();
        let state = ready(&mut rx, generation.epoch).await;

        let board = state.leaderboard.unwrap();
        assert_eq!(board.session_key, OLDER_SESSION_KEY);
        assert!(board.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_snapshot() {
        let (provider, scheduler) = scheduler();
        let mut rx = scheduler.state();

        let generation = scheduler.activate(SAMPLE_SESSION_KEY, true);
        let first = ready(&mut rx, generation.epoch).await.leaderboard.unwrap();

        provider.fail_next("positions", DashboardError::network("/position", "reset"));
        advance(INTERVAL + Duration::from_millis(1)).await;

        let state = scheduler.current();
        assert_eq!(state.status, FeedStatus::Failed { consecutive: 1 });
        assert!(state.leaderboard.unwrap().same_standings(&first));

        advance(INTERVAL).await;
        assert_eq!(scheduler.current().status, FeedStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn same_session_reactivation_keeps_delta_baseline() {
        let (provider, scheduler) = scheduler();
        let mut rx = scheduler.state();
        provider.replay().set_cutoff(Some(ts(300)));

        let live = scheduler.activate(SAMPLE_SESSION_KEY, true);
        let state = ready(&mut rx, live.epoch).await;
        assert_eq!(state.leaderboard.unwrap().leader().unwrap().driver_number, 16);

        provider.replay().set_cutoff(None);
        let finished = scheduler.activate(SAMPLE_SESSION_KEY, false);
        assert!(scheduler.current().leaderboard.is_some());

        let board = ready(&mut rx, finished.epoch).await.leaderboard.unwrap();
        let max = board.entry(1).unwrap();
        assert_eq!(max.previous_position, 2);
        assert_eq!(max.change(), PositionChange::Improved(1));
    }

    #[tokio::test(start_paused = true)]
    async fn other_session_clears_snapshot() {
        let (_provider, scheduler) = scheduler();
        let mut rx = scheduler.state();

        let generation = scheduler.activate(SAMPLE_SESSION_KEY, false);
        ready(&mut rx, generation.epoch).await;

        scheduler.activate(OLDER_SESSION_KEY, false);
        let state = scheduler.current();
        assert!(state.leaderboard.is_none());
        assert_eq!(state.status, FeedStatus::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_scheduler_stops_polling() {
        let (provider, scheduler) = scheduler();
        let mut rx = scheduler.state();

        let generation = scheduler.activate(SAMPLE_SESSION_KEY, true);
        ready(&mut rx, generation.epoch).await;
        drop(scheduler);

        advance(INTERVAL * 3).await;
        assert_eq!(provider.calls("positions"), 1);
    }

    fn task_for(
        scheduler: &RefreshScheduler<ScriptedProvider>,
        generation: Generation,
        is_live: bool,
    ) -> PollTask<ScriptedProvider> {
        PollTask {
            aggregator: scheduler.aggregator.clone(),
            state: Arc::clone(&scheduler.state),
            generation,
            session_key: SAMPLE_SESSION_KEY,
            is_live,
            interval: INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_generation_cannot_publish() {
        let (_provider, scheduler) = scheduler();
        let mut rx = scheduler.state();

        let stale = scheduler.activate(SAMPLE_SESSION_KEY, false);
        ready(&mut rx, stale.epoch).await;
        let current = scheduler.activate(SAMPLE_SESSION_KEY, false);
        let before = ready(&mut rx, current.epoch).await;

        let task = task_for(&scheduler, stale, false);
        let applied = task.publish(|state| {
            state.status = FeedStatus::Failed { consecutive: 1 };
            state.leaderboard = None;
        });
        assert!(!applied);

        let after = scheduler.current();
        assert_eq!(after.generation, current);
        assert_eq!(after.status, FeedStatus::Ready);
        assert!(Arc::ptr_eq(&after.leaderboard.unwrap(), &before.leaderboard.unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn uncancelled_stale_task_stops_at_first_result() {
        let (provider, scheduler) = scheduler();
        let mut rx = scheduler.state();

        let stale = scheduler.activate(SAMPLE_SESSION_KEY, true);
        ready(&mut rx, stale.epoch).await;
        scheduler.deactivate();
        let calls = provider.calls("positions");

        // A live task whose token was never cancelled still ends once the
        // write-point check rejects its result
        task_for(&scheduler, stale, true).run(None).await;

        assert_eq!(provider.calls("positions"), calls + 1);
        let state = scheduler.current();
        assert_eq!(state.generation.session_key, None);
        assert_eq!(state.status, FeedStatus::Idle);
        assert!(state.leaderboard.is_none());
    }
}
