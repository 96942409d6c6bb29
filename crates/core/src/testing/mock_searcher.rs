//! Mock searcher for testing.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::query::SearchQuery;
use crate::searcher::{CatalogResponse, SearchError, Searcher};

/// Mock implementation of the `Searcher` trait.
///
/// Returns a configured response (empty by default) or error, and records
/// every query it receives.
#[derive(Debug, Default)]
pub struct MockSearcher {
    response: RwLock<CatalogResponse>,
    error: RwLock<Option<SearchError>>,
    delay: RwLock<Option<Duration>>,
    queries: RwLock<Vec<SearchQuery>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response returned by later searches.
    pub async fn set_response(&self, response: CatalogResponse) {
        *self.response.write().await = response;
    }

    /// Fail every later search with `error`.
    pub async fn set_error(&self, error: SearchError) {
        *self.error.write().await = Some(error);
    }

    pub async fn clear_error(&self) {
        *self.error.write().await = None;
    }

    /// Delay each search, e.g. to hold requests in flight.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Queries searched so far, in order.
    pub async fn recorded_queries(&self) -> Vec<SearchQuery> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &SearchQuery) -> Result<CatalogResponse, SearchError> {
        self.queries.write().await.push(query.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.error.read().await.clone() {
            return Err(error);
        }
        Ok(self.response.read().await.clone())
    }
}
