//! Upstream catalog search.
//!
//! This module provides a `Searcher` trait for querying the shop's catalog
//! API and `PlannerSearcher`, which runs searches on the broker's session and
//! re-authenticates once when the shop rejects it.

mod planner;
mod types;

pub use planner::PlannerSearcher;
pub use types::*;
