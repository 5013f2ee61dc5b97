//! Race dashboard client for the OpenF1 API.
//!
//! Pitboard polls race data (positions, drivers, laps, tyre stints) and turns
//! it into immutable view models a UI can render directly: a ranked,
//! change-annotated leaderboard and per-driver tyre and sector breakdowns.
//!
//! # Features
//!
//! - **Standings reconciliation**: latest position per driver, best or last
//!   lap depending on liveness, change indicators against the previous snapshot
//! - **Race-free refreshing**: a superseded or cancelled fetch can never
//!   overwrite newer state
//! - **Replay**: recorded OpenF1 payloads behave exactly like the live API
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use pitboard::{DashboardConfig, Pitboard};
//!
//! #[tokio::main]
//! async fn main() -> pitboard::Result<()> {
//!     let dashboard = Pitboard::connect(&DashboardConfig::load()?).await?;
//!     let mut updates = Box::pin(dashboard.leaderboard_updates());
//!
//!     while let Some(board) = updates.next().await {
//!         for entry in board.iter() {
//!             println!(
//!                 "{:>2} {:<24} {:>10} {}",
//!                 entry.position,
//!                 entry.driver_name,
//!                 entry.lap_time_display,
//!                 entry.change()
//!             );
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
mod json_utils;
pub mod logging;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Data access
pub mod provider;
pub mod providers;
pub mod schema;

// Reduction and refresh
pub mod aggregate;
pub mod connection;
pub mod resolver;
pub mod scheduler;
pub mod stream;

// Core exports
pub use error::*;
pub use types::*;

pub use aggregate::{CompoundUsage, SectorPoint, StandingsAggregator};
pub use config::DashboardConfig;
pub use connection::{Dashboard, DriverView};
pub use provider::{RaceDataProvider, SessionQuery};
pub use providers::{OpenF1Provider, ReplayProvider};
pub use resolver::SessionResolver;
pub use scheduler::{FeedState, FeedStatus, Generation, RefreshScheduler};
pub use schema::{Driver, LapRecord, PositionSample, Session, TyreCompound, TyreStint};

use std::path::Path;
use std::sync::Arc;

/// Unified entry point for dashboards.
///
/// Builds a [`Dashboard`] over either the OpenF1 API or a directory of
/// recorded payloads. Both behave the same from the consumer's side.
///
/// # Examples
///
/// ```rust,no_run
/// use pitboard::{DashboardConfig, Pitboard};
///
/// # #[tokio::main]
/// # async fn main() -> pitboard::Result<()> {
/// let live = Pitboard::connect(&DashboardConfig::default()).await?;
/// let replay = Pitboard::replay("fixtures/monza-2024").await?;
/// # Ok(())
/// # }
/// ```
pub struct Pitboard;

impl Pitboard {
    /// Start a dashboard over the OpenF1 API.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] if `config` is invalid. Upstream
    /// failures are not errors here; the dashboard starts idle instead.
    pub async fn connect(config: &DashboardConfig) -> Result<Dashboard<OpenF1Provider>> {
        let provider = OpenF1Provider::new(config)?;
        Dashboard::start(Arc::new(provider), config).await
    }

    /// Start a dashboard over recorded payloads in `dir`.
    ///
    /// The latest race in the directory is selected as of now, so recorded
    /// races are shown finished (best laps).
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Fixture`] or [`DashboardError::Decode`] if
    /// the directory cannot be loaded.
    pub async fn replay<P: AsRef<Path>>(dir: P) -> Result<Dashboard<ReplayProvider>> {
        let provider = ReplayProvider::open(dir)?;
        Dashboard::start(Arc::new(provider), &DashboardConfig::default()).await
    }
}
