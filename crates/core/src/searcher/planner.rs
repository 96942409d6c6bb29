//! Cruise planner catalog search over the broker's session.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, warn};

use crate::config::UpstreamConfig;
use crate::metrics::{SESSION_RETRIES, UPSTREAM_DURATION, UPSTREAM_REQUESTS};
use crate::query::SearchQuery;
use crate::session::{SessionBroker, SessionToken};

use super::{CatalogResponse, SearchError, Searcher};

/// Searches the shop catalog with the session cookie held by a
/// `SessionBroker`.
pub struct PlannerSearcher {
    client: Client,
    upstream: UpstreamConfig,
    broker: SessionBroker,
}

impl PlannerSearcher {
    pub fn new(upstream: UpstreamConfig, broker: SessionBroker) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(upstream.timeout_secs as u64))
            .user_agent(upstream.user_agent.clone())
            .default_headers(browser_headers())
            .build()
            .map_err(|e| SearchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            upstream,
            broker,
        })
    }

    /// One request with one token. A 401 comes back as `AuthExpired`.
    async fn fetch(
        &self,
        url: &str,
        token: &SessionToken,
        query: &SearchQuery,
    ) -> Result<CatalogResponse, SearchError> {
        let started = Instant::now();
        let result = self.send(url, token, query).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        UPSTREAM_REQUESTS.with_label_values(&[outcome]).inc();
        UPSTREAM_DURATION
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn send(
        &self,
        url: &str,
        token: &SessionToken,
        query: &SearchQuery,
    ) -> Result<CatalogResponse, SearchError> {
        debug!(query = %query.raw_query, url = url, "Querying endpoint");

        let response = self
            .client
            .get(url)
            .header(header::COOKIE, token.cookie_pair())
            .send()
            .await
            .map_err(|e| {
                error!(query = %query.raw_query, error = %e, "Request to source failed");
                SearchError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(query = %query.raw_query, error = %e, "Failed to read response body");
            SearchError::Transport(e.to_string())
        })?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(SearchError::AuthExpired);
        }

        if !status.is_success() {
            error!(query = %query.raw_query, status = status.as_u16(), "Error from source");
            debug!(query = %query.raw_query, body = %body, "Dumping input");
            return Err(SearchError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(query = %query.raw_query, "Malformed JSON response");
            debug!(query = %query.raw_query, body = %body, "Dumping input");
            SearchError::MalformedResponse(e.to_string())
        })
    }
}

#[async_trait]
impl Searcher for PlannerSearcher {
    fn name(&self) -> &str {
        "cruise-planner"
    }

    async fn search(&self, query: &SearchQuery) -> Result<CatalogResponse, SearchError> {
        let url = self.upstream.search_url(query.category.upstream_id);
        let token = self.broker.acquire().await?;

        match self.fetch(&url, &token, query).await {
            Err(SearchError::AuthExpired) => {
                warn!(query = %query.raw_query, "Session rejected, attempting to relogin");
                SESSION_RETRIES.inc();
                self.broker.invalidate(&token).await;

                // A lockout hit while re-acquiring is reported as such.
                let token = self.broker.acquire().await?;
                let retried = self.fetch(&url, &token, query).await;
                if matches!(retried, Err(SearchError::AuthExpired)) {
                    self.broker.invalidate(&token).await;
                }
                retried
            }
            other => other,
        }
    }
}

/// Headers a desktop Firefox sends, which the shop expects.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CategoryRegistry;
    use crate::query::validate;
    use crate::session::{SessionError, SessionState};
    use crate::testing::{fixtures, MockAutomation};
    use std::sync::Arc;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_PATH: &str = "/cruiseplanner/api/browseCatalog/1011";

    async fn setup(server: &MockServer) -> (PlannerSearcher, SessionBroker, Arc<MockAutomation>) {
        let automation = Arc::new(MockAutomation::new());
        let broker = fixtures::broker(Arc::clone(&automation));
        let searcher = PlannerSearcher::new(
            fixtures::upstream_config(&format!("{}/cruiseplanner/", server.uri())),
            broker.clone(),
        )
        .unwrap();
        (searcher, broker, automation)
    }

    fn dining() -> SearchQuery {
        validate(&CategoryRegistry::cruise_planner(), Some("dining"))
    }

    #[tokio::test]
    async fn test_search_sends_session_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .and(header_eq("cookie", "JSESSIONIDPCP=session-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixtures::catalog_json(3)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (searcher, _broker, _automation) = setup(&server).await;
        let response = searcher.search(&dining()).await.unwrap();

        assert_eq!(response.result_count, 3);
        assert_eq!(response.tiles().len(), 3);
    }

    #[tokio::test]
    async fn test_unauthorized_then_success_retries_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .and(header_eq("cookie", "JSESSIONIDPCP=session-1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .and(header_eq("cookie", "JSESSIONIDPCP=session-2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixtures::catalog_json(1)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (searcher, broker, automation) = setup(&server).await;
        let response = searcher.search(&dining()).await.unwrap();

        assert_eq!(response.tiles().len(), 1);
        assert_eq!(automation.login_count(), 2);
        match broker.state().await {
            SessionState::Authenticated { token } => assert_eq!(token.value, "session-2"),
            other => panic!("expected authenticated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_auth_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let (searcher, broker, automation) = setup(&server).await;
        let err = searcher.search(&dining()).await.unwrap_err();

        assert!(matches!(err, SearchError::AuthExpired));
        assert_eq!(automation.login_count(), 2);
        // The rejected session is not handed to the next caller.
        assert_eq!(broker.state().await, SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_lockout_during_retry_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let (searcher, _broker, automation) = setup(&server).await;
        // The first login succeeds. The relogin gets no cookie.
        automation.withhold_session_cookie_after(1);

        let err = searcher.search(&dining()).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Session(SessionError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let (searcher, _broker, automation) = setup(&server).await;
        match searcher.search(&dining()).await.unwrap_err() {
            SearchError::Upstream { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert_eq!(automation.login_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let (searcher, _broker, _automation) = setup(&server).await;
        let err = searcher.search(&dining()).await.unwrap_err();
        assert!(matches!(err, SearchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_session_failure_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let automation = Arc::new(MockAutomation::new().withhold_session_cookie());
        let broker = fixtures::broker(Arc::clone(&automation));
        let searcher = PlannerSearcher::new(
            fixtures::upstream_config(&format!("{}/cruiseplanner/", server.uri())),
            broker,
        )
        .unwrap();

        let err = searcher.search(&dining()).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Session(SessionError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let automation = Arc::new(MockAutomation::new());
        let broker = fixtures::broker(automation);
        let searcher =
            PlannerSearcher::new(fixtures::upstream_config("http://127.0.0.1:9/"), broker)
                .unwrap();

        let err = searcher.search(&dining()).await.unwrap_err();
        assert!(matches!(err, SearchError::Transport(_)));
    }

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers();
        assert_eq!(headers[header::ACCEPT_LANGUAGE], "en-US,en;q=0.5");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    }
}
