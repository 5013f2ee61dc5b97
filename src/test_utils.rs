//! Test utilities: fixture builders and a scriptable provider
//!
//! [`ScriptedProvider`] serves [`ReplayData`] but lets a test count calls per
//! endpoint, inject failures and hold responses behind a gate, which is how
//! slow or superseded fetches are simulated.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Semaphore;

use crate::{DashboardError, Result};
use crate::provider::{RaceDataProvider, SessionQuery};
use crate::providers::{ReplayData, ReplayProvider, SessionData};
use crate::schema::{Driver, LapRecord, PositionSample, Session, TyreStint};

/// Session key of the fixture race.
pub const SAMPLE_SESSION_KEY: u32 = 9590;

/// Session key of an older fixture race with no timing data.
pub const OLDER_SESSION_KEY: u32 = 9574;

/// Start of the fixture race plus `seconds`.
pub fn ts(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 13, 0, 0).unwrap() + Duration::seconds(seconds)
}

/// Fixture race session (two hours from [`ts`]`(0)`).
pub fn sample_session() -> Session {
    Session::race(SAMPLE_SESSION_KEY, "Monza", ts(0), ts(7200))
}

/// Three-driver race at Monza.
///
/// Grid order is 1, 4, 16. At [`ts`]`(300)` #16 leads ahead of 1 and 4; at
/// [`ts`]`(600)` #1 retakes the lead and the final order is 1, 16, 4.
pub fn sample_race() -> ReplayData {
    let older = Session::race(
        OLDER_SESSION_KEY,
        "Zandvoort",
        Utc.with_ymd_and_hms(2024, 8, 25, 13, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 8, 25, 15, 0, 0).unwrap(),
    );

    let drivers = vec![
        Driver::new(1, "Max VERSTAPPEN", "Red Bull Racing"),
        Driver::new(16, "Charles LECLERC", "Ferrari"),
        Driver::new(4, "Lando NORRIS", "McLaren"),
    ];

    let positions = vec![
        PositionSample::new(1, 1, ts(0)),
        PositionSample::new(4, 2, ts(0)),
        PositionSample::new(16, 3, ts(0)),
        PositionSample::new(16, 1, ts(300)),
        PositionSample::new(1, 2, ts(300)),
        PositionSample::new(4, 3, ts(300)),
        PositionSample::new(1, 1, ts(600)),
        PositionSample::new(16, 2, ts(600)),
    ];

    let mut laps = Vec::new();
    for (driver, base) in [(1u32, 84.0f64), (16, 83.5), (4, 84.2)] {
        for lap in 1..=6u32 {
            let duration = if lap == 1 { None } else { Some(base + f64::from(lap % 3) * 0.4) };
            let mut record = LapRecord::new(driver, lap, duration);
            record.date_start = Some(ts(i64::from(lap - 1) * 85));
            if let Some(total) = duration {
                record = record.with_sectors(total * 0.33, total * 0.37, total * 0.30);
            }
            laps.push(record);
        }
    }

    let stints = vec![
        TyreStint::new(16, "MEDIUM", 1, 3),
        TyreStint::new(16, "HARD", 4, 6),
        TyreStint::new(1, "HARD", 1, 6),
    ];

    let mut by_session = HashMap::new();
    by_session.insert(SAMPLE_SESSION_KEY, SessionData { drivers, positions, laps, stints });

    ReplayData { sessions: vec![older, sample_session()], by_session }
}

/// Handle that releases responses held by [`ScriptedProvider::hold`].
#[derive(Debug, Clone)]
pub struct Gate(Arc<Semaphore>);

impl Gate {
    /// Let every current and future held response through.
    pub fn open(&self) {
        self.0.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

/// Provider with call counting, failure injection and gated responses
#[derive(Debug)]
pub struct ScriptedProvider {
    inner: ReplayProvider,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, VecDeque<DashboardError>>>,
    gates: Mutex<HashMap<&'static str, Gate>>,
    unfiltered_sessions: AtomicBool,
}

impl ScriptedProvider {
    pub fn new(data: ReplayData) -> Self {
        Self {
            inner: ReplayProvider::new(data),
            calls: Mutex::default(),
            failures: Mutex::default(),
            gates: Mutex::default(),
            unfiltered_sessions: AtomicBool::new(false),
        }
    }

    /// Underlying replay provider, e.g. to change data between refreshes.
    pub fn replay(&self) -> &ReplayProvider {
        &self.inner
    }

    /// Number of calls made to `endpoint` so far.
    pub fn calls(&self, endpoint: &'static str) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).get(endpoint).copied().unwrap_or(0)
    }

    /// Make the next call to `endpoint` fail with `error`.
    pub fn fail_next(&self, endpoint: &'static str, error: DashboardError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint)
            .or_default()
            .push_back(error);
    }

    /// Hold every call to `endpoint` until the returned gate releases it.
    pub fn hold(&self, endpoint: &'static str) -> Gate {
        let gate = Gate(Arc::new(Semaphore::new(0)));
        self.gates.lock().unwrap_or_else(PoisonError::into_inner).insert(endpoint, gate.clone());
        gate
    }

    /// Answer session queries with every session, like an upstream that
    /// drops query filters.
    pub fn ignore_session_filters(&self) {
        self.unfiltered_sessions.store(true, Ordering::Relaxed);
    }

    async fn enter(&self, endpoint: &'static str) -> Result<()> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner).entry(endpoint).or_insert(0) += 1;

        let gate = self.gates.lock().unwrap_or_else(PoisonError::into_inner).get(endpoint).cloned();
        if let Some(Gate(semaphore)) = gate {
            if let Ok(permit) = semaphore.acquire().await {
                permit.forget();
            }
        }

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RaceDataProvider for ScriptedProvider {
    async fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>> {
        self.enter("sessions").await?;
        if self.unfiltered_sessions.load(Ordering::Relaxed) {
            return self.inner.sessions(&SessionQuery::default()).await;
        }
        self.inner.sessions(query).await
    }

    async fn drivers(&self, session_key: u32) -> Result<Vec<Driver>> {
        self.enter("drivers").await?;
        self.inner.drivers(session_key).await
    }

    async fn positions(&self, session_key: u32) -> Result<Vec<PositionSample>> {
        self.enter("positions").await?;
        self.inner.positions(session_key).await
    }

    async fn laps(&self, session_key: u32, driver_number: Option<u32>) -> Result<Vec<LapRecord>> {
        self.enter("laps").await?;
        self.inner.laps(session_key, driver_number).await
    }

    async fn stints(&self, session_key: u32, driver_number: u32) -> Result<Vec<TyreStint>> {
        self.enter("stints").await?;
        self.inner.stints(session_key, driver_number).await
    }
}
