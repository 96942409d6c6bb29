//! Shop categories exposed as feeds.
//!
//! This module provides the static `CategoryRegistry` mapping the query codes
//! accepted by the feed endpoint to the shop's internal category ids.

mod registry;
mod types;

pub use registry::CategoryRegistry;
pub use types::*;
