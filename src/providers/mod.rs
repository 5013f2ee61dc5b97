//! Race data provider implementations

pub mod http;
pub mod replay;

pub use http::OpenF1Provider;
pub use replay::{ReplayData, ReplayProvider, SessionData};
