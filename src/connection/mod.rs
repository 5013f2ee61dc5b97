//! Dashboard connection
//!
//! A [`Dashboard`] ties a provider to a
//! [`SessionResolver`](crate::resolver::SessionResolver) and a
//! [`RefreshScheduler`](crate::scheduler::RefreshScheduler). It keeps the
//! selected session, exposes the latest leaderboard as a value and as a
//! stream, and builds per-driver views on demand.

mod dashboard;

pub use dashboard::{Dashboard, DriverView};
