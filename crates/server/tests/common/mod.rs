//! Common test utilities for in-process HTTP testing.
//!
//! This module provides a test fixture that builds the router with mock
//! collaborators injected, so routes can be exercised without a browser or
//! the real shop.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use cruisefeed_core::{
    testing::{MockAutomation, MockSearcher},
    AllowListSanitizer, CategoryRegistry, Config, FeedAssembler, FeedPipeline, PlannerSearcher,
    Searcher, SessionBroker,
};
use cruisefeed_server::state::AppState;

/// Re-export fixtures for test convenience
pub use cruisefeed_core::testing::fixtures;

/// Test fixture with controllable collaborators.
///
/// - `searcher` is set when the fixture uses `MockSearcher`
/// - `automation` always backs the session broker
pub struct TestFixture {
    pub router: Router,
    pub searcher: Option<Arc<MockSearcher>>,
    pub automation: Arc<MockAutomation>,
    pub broker: SessionBroker,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestFixture {
    /// Fixture whose catalog search is a `MockSearcher`.
    pub fn new() -> Self {
        let searcher = Arc::new(MockSearcher::new());
        let mut fixture = Self::build(
            Config::default(),
            Arc::clone(&searcher) as Arc<dyn Searcher>,
            None,
        );
        fixture.searcher = Some(searcher);
        fixture
    }

    /// Fixture that searches a fake shop at `base_url` over HTTP.
    pub fn with_upstream(base_url: &str) -> Self {
        let mut config = Config::default();
        config.upstream = fixtures::upstream_config(base_url);

        let automation = Arc::new(MockAutomation::new());
        let broker = fixtures::broker(Arc::clone(&automation));
        let searcher = PlannerSearcher::new(config.upstream.clone(), broker.clone())
            .expect("Failed to create searcher");

        Self::build(config, Arc::new(searcher), Some((automation, broker)))
    }

    fn build(
        config: Config,
        searcher: Arc<dyn Searcher>,
        session: Option<(Arc<MockAutomation>, SessionBroker)>,
    ) -> Self {
        let (automation, broker) = session.unwrap_or_else(|| {
            let automation = Arc::new(MockAutomation::new());
            let broker = fixtures::broker(Arc::clone(&automation));
            (automation, broker)
        });

        let assembler = FeedAssembler::new(
            &config.upstream,
            &config.feed,
            Arc::new(AllowListSanitizer::new()),
        );
        let pipeline = FeedPipeline::new(CategoryRegistry::cruise_planner(), searcher, assembler);
        let state = Arc::new(AppState::new(config, pipeline, broker.clone()));

        Self {
            router: cruisefeed_server::api::create_router(state),
            searcher: None,
            automation,
            broker,
        }
    }

    /// The mock searcher; panics for `with_upstream` fixtures.
    pub fn searcher(&self) -> &MockSearcher {
        self.searcher
            .as_deref()
            .expect("fixture was built with a real searcher")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
