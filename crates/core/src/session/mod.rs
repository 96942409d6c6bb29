//! Shared upstream session.
//!
//! This module provides the `SessionBroker`, the single owner of the
//! authenticated shop session. Every component that needs the session goes
//! through `acquire`, `invalidate` and `logout`; the broker serializes login
//! attempts so concurrent requests never run two login sequences at once.

mod broker;
mod types;

pub use broker::{BrokerSettings, SessionBroker};
pub use types::*;
