use tracing::debug;

use super::{Category, RegistryError};

/// Spa is left out: its catalog API takes a different request shape.
const PLANNER_CATEGORIES: [Category; 6] = [
    Category::new("excursions", "1002", "Shore Excursions"),
    Category::new("beverage", "1012", "Beverage Packages"),
    Category::new("internet", "1051", "Internet & More"),
    Category::new("entertainment", "1031", "Entertainment"),
    Category::new("activities", "1032", "Activities"),
    Category::new("dining", "1011", "Dining"),
];

const PLANNER_DEFAULT: &str = "dining";

/// Immutable lookup table from query code to category.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    default_index: usize,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::cruise_planner()
    }
}

impl CategoryRegistry {
    /// The shop's built-in categories, defaulting to dining.
    pub fn cruise_planner() -> Self {
        let default_index = PLANNER_CATEGORIES
            .iter()
            .position(|c| c.code == PLANNER_DEFAULT)
            .unwrap_or(0);
        Self {
            categories: PLANNER_CATEGORIES.to_vec(),
            default_index,
        }
    }

    /// Build a registry from an explicit list.
    ///
    /// Codes must be unique and `default_code` must name one of them.
    pub fn new(categories: Vec<Category>, default_code: &str) -> Result<Self, RegistryError> {
        for (i, category) in categories.iter().enumerate() {
            if categories[..i].iter().any(|c| c.code == category.code) {
                return Err(RegistryError::DuplicateCode(category.code.to_string()));
            }
        }

        let default_index = categories
            .iter()
            .position(|c| c.code == default_code)
            .ok_or_else(|| RegistryError::UnknownDefault(default_code.to_string()))?;

        debug!(
            categories = categories.len(),
            default = default_code,
            "Category registry built"
        );

        Ok(Self {
            categories,
            default_index,
        })
    }

    /// Look up a category by its exact query code.
    pub fn get(&self, code: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn default_category(&self) -> &Category {
        &self.categories[self.default_index]
    }

    /// Resolve a code, falling back to the default category.
    pub fn resolve(&self, code: &str) -> &Category {
        self.get(code).unwrap_or_else(|| self.default_category())
    }

    /// Query codes in registry order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.categories.iter().map(|c| c.code).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
