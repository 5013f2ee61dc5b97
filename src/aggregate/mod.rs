//! Reductions from raw upstream arrays to view models
//!
//! Everything here is synchronous and pure except
//! [`StandingsAggregator::refresh`], which performs the concurrent fetch
//! before handing off to [`reconcile`].

pub mod laps;
pub mod positions;
pub mod sectors;
pub mod standings;
pub mod tyres;

pub use laps::{best_lap_times, last_lap_times};
pub use positions::{latest_positions, ranking};
pub use sectors::{SectorPoint, sector_series};
pub use standings::{RaceData, StandingsAggregator, reconcile};
pub use tyres::{CompoundUsage, tyre_usage};
