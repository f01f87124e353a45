//! Search-space orchestration for regscout.
//!
//! The registry can only be enumerated through narrow prefix queries, so
//! complete coverage is a search-space problem: this crate models one atomic
//! query as a [`SearchUnit`], turns a partially-completed unit set into the
//! next units to try via a [`SearchStrategy`], and orders pending work in a
//! [`Frontier`] that supports resuming an interrupted run.

pub mod frontier;
pub mod strategy;
pub mod unit;

pub use frontier::Frontier;
pub use strategy::{
    AdaptiveStrategy, ComprehensiveStrategy, DepthProgress, MultiDimensionalStrategy, PrefixSpace,
    SearchStrategy,
};
pub use unit::{SearchMode, SearchUnit};
