use serde::Serialize;

use crate::catalog::{Category, CategoryRegistry};

/// A feed request resolved against the category registry.
///
/// Always fully populated: an invalid query still carries the default
/// category so callers can log and report it uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    /// Query code as requested, or the default code when none was given.
    pub raw_query: String,
    pub category: Category,
    /// Validation errors in the order they were found.
    pub errors: Vec<String>,
}

impl SearchQuery {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Normalize an inbound `query` parameter into a `SearchQuery`.
///
/// Absent or empty input selects the default category without error. Unknown
/// codes produce one error and resolve to the default category.
pub fn validate(registry: &CategoryRegistry, raw_query: Option<&str>) -> SearchQuery {
    let default = registry.default_category();
    let raw_query = match raw_query {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => default.code.to_string(),
    };

    let mut errors = Vec::new();
    if !registry.contains(&raw_query) {
        errors.push(invalid_query_message(registry));
    }

    let category = *registry.resolve(&raw_query);

    SearchQuery {
        raw_query,
        category,
        errors,
    }
}

/// Error listing the accepted codes in registry order.
pub fn invalid_query_message(registry: &CategoryRegistry) -> String {
    format!(
        "Invalid query, must be one of the following: {}",
        registry.codes().join(", ")
    )
}
