//! Request pipeline: validate, search, assemble.

mod error;

pub use error::{FeedError, FeedErrorKind};

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::CategoryRegistry;
use crate::feed::{FeedAssembler, JsonFeed};
use crate::metrics::FEED_ITEMS_PUBLISHED;
use crate::query::validate;
use crate::searcher::Searcher;

/// Serves one feed request end to end.
pub struct FeedPipeline {
    registry: CategoryRegistry,
    searcher: Arc<dyn Searcher>,
    assembler: FeedAssembler,
}

impl FeedPipeline {
    pub fn new(
        registry: CategoryRegistry,
        searcher: Arc<dyn Searcher>,
        assembler: FeedAssembler,
    ) -> Self {
        Self {
            registry,
            searcher,
            assembler,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Build the feed for an inbound `query` parameter.
    ///
    /// Invalid queries fail before any upstream work.
    pub async fn run(&self, raw_query: Option<&str>) -> Result<JsonFeed, FeedError> {
        let query = validate(&self.registry, raw_query);
        if !query.is_valid() {
            warn!(query = %query.raw_query, errors = ?query.errors, "Rejected query");
            return Err(FeedError::new(
                &query.raw_query,
                FeedErrorKind::Validation(query.errors),
            ));
        }

        let response = self
            .searcher
            .search(&query)
            .await
            .map_err(|e| FeedError::new(&query.raw_query, e.into()))?;

        let feed = self.assembler.assemble(&query, &response);
        let found = response.tiles().len();
        info!(
            query = %query.raw_query,
            searcher = self.searcher.name(),
            "found {} - published {}",
            found,
            feed.items.len()
        );
        FEED_ITEMS_PUBLISHED
            .with_label_values(&[query.category.code])
            .inc_by(feed.items.len() as u64);

        Ok(feed)
    }
}
