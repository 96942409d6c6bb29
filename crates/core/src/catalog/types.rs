//! Types for the category registry.

use serde::Serialize;
use thiserror::Error;

/// A shop category that can be queried as a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Category {
    /// Query code accepted from feed readers.
    pub code: &'static str,
    /// Category id used by the shop's catalog API and browse pages.
    pub upstream_id: &'static str,
    /// Human readable name.
    pub display_name: &'static str,
}

impl Category {
    pub const fn new(
        code: &'static str,
        upstream_id: &'static str,
        display_name: &'static str,
    ) -> Self {
        Self {
            code,
            upstream_id,
            display_name,
        }
    }
}

/// Errors building a custom registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate category code: {0}")]
    DuplicateCode(String),

    #[error("Default category not in registry: {0}")]
    UnknownDefault(String),
}
