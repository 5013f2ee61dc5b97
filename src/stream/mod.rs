//! Stream combinators

mod distinct;

pub use distinct::{Distinct, DistinctExt};
