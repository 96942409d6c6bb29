//! Types for the catalog search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::SearchQuery;
use crate::session::SessionError;

/// Catalog search response.
///
/// Only the fields the feed uses are modeled; everything is optional so a
/// missing field is a typed absence rather than a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    /// Total matching products.
    #[serde(default)]
    pub result_count: u64,
    #[serde(default)]
    pub groups: Vec<CatalogGroup>,
}

impl CatalogResponse {
    /// Products of the first group, or nothing when the shop reports no
    /// matches.
    pub fn tiles(&self) -> &[CatalogTile] {
        if self.result_count == 0 {
            return &[];
        }
        self.groups
            .first()
            .map(|g| g.tiles.as_slice())
            .unwrap_or_default()
    }
}

/// A group of products.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogGroup {
    #[serde(default)]
    pub tiles: Vec<CatalogTile>,
}

/// A single product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogTile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<TileImage>,
    #[serde(default)]
    pub prices: Vec<TilePrice>,
}

impl CatalogTile {
    /// Thumbnail path, if the product has one.
    pub fn thumbnail(&self) -> Option<&str> {
        self.image
            .as_ref()
            .and_then(|i| i.medium_image_path.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Price label such as `USD45.99`, from the first listed price.
    pub fn price_label(&self) -> Option<String> {
        let price = self.prices.first()?;
        match (&price.currency_code, &price.formatted_cost) {
            (Some(currency), Some(cost)) => Some(format!("{}{}", currency, cost)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium_image_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilePrice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_cost: Option<String>,
}

/// Errors that can occur during search operations.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// No session could be acquired; the request was never sent.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Session rejected by upstream after re-authenticating")]
    AuthExpired,

    #[error("HTTP status from source: {status}")]
    Upstream { status: u16, body: String },

    #[error("Malformed JSON response: {0}")]
    MalformedResponse(String),

    #[error("Request to source failed: {0}")]
    Transport(String),
}

impl SearchError {
    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Session(e) => e.label(),
            Self::AuthExpired => "auth_expired",
            Self::Upstream { .. } => "upstream_error",
            Self::MalformedResponse(_) => "malformed",
            Self::Transport(_) => "transport",
        }
    }
}

/// Trait for catalog search backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Search the catalog for a validated query.
    async fn search(&self, query: &SearchQuery) -> Result<CatalogResponse, SearchError>;
}
