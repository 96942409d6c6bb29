//! HTTP tests for the feed, session and operations routes.

mod common;

use std::time::Duration;

use axum::http::{header, StatusCode};
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{fixtures, TestFixture};
use cruisefeed_core::{SearchError, SessionError, SessionState};

#[tokio::test]
async fn test_root_serves_default_feed() {
    let fixture = TestFixture::new();
    fixture
        .searcher()
        .set_response(fixtures::catalog_response(3))
        .await;

    let response = fixture.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers[header::CONTENT_TYPE],
        "application/feed+json"
    );
    assert_eq!(response.body["version"], "https://jsonfeed.org/version/1.1");
    assert_eq!(response.body["title"], "secure.royalcaribbean.com - dining");
    assert_eq!(
        response.body["home_page_url"],
        "https://secure.royalcaribbean.com/cruiseplanner/category/1011"
    );
    assert_eq!(response.body["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_route_with_query() {
    let fixture = TestFixture::new();
    fixture
        .searcher()
        .set_response(fixtures::catalog_response(2))
        .await;

    let response = fixture.get("/search?query=internet").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "secure.royalcaribbean.com - internet");

    let item = &response.body["items"][1];
    assert_eq!(item["id"], item["url"]);
    assert_eq!(item["title"], "[USD2.99] Product 2");
    assert_eq!(item["image"], "https://img.example.test/2.jpg");
    assert!(item["date_published"].as_str().unwrap().ends_with('Z'));

    // Product 1 has no image, so the field is omitted
    assert!(response.body["items"][0].get("image").is_none());
}

#[tokio::test]
async fn test_bogus_query_is_bad_request() {
    let fixture = TestFixture::new();

    let response = fixture.get("/search?query=bogus").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["query"], "bogus");
    assert_eq!(
        response.body["details"][0],
        "Invalid query, must be one of the following: excursions, beverage, internet, entertainment, activities, dining"
    );
    assert!(fixture.searcher().recorded_queries().await.is_empty());
}

#[tokio::test]
async fn test_repeated_query_param_is_json_bad_request() {
    let fixture = TestFixture::new();

    let response = fixture.get("/search?query=dining&query=beverage").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(response.body["query"], "query=dining&query=beverage");
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Errors found: "));
    assert_eq!(response.body["details"].as_array().unwrap().len(), 2);
    assert!(response.body["details"][1]
        .as_str()
        .unwrap()
        .starts_with("Invalid query, must be one of the following: "));
    assert!(fixture.searcher().recorded_queries().await.is_empty());
}

#[tokio::test]
async fn test_empty_query_uses_default() {
    let fixture = TestFixture::new();

    let response = fixture.get("/search?query=").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "secure.royalcaribbean.com - dining");
    assert_eq!(response.body["items"], serde_json::json!([]));
}

#[tokio::test]
async fn test_rate_limited_is_429_with_retry_after() {
    let fixture = TestFixture::new();
    fixture
        .searcher()
        .set_error(SearchError::Session(SessionError::RateLimited {
            retry_after: Duration::from_secs(600),
        }))
        .await;

    let response = fixture.get("/?query=beverage").await;

    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers[header::RETRY_AFTER], "600");
    assert_eq!(response.body["retry_after_secs"], 600);
    assert_eq!(response.body["query"], "beverage");
}

#[tokio::test]
async fn test_auth_expired_is_401() {
    let fixture = TestFixture::new();
    fixture.searcher().set_error(SearchError::AuthExpired).await;

    let response = fixture.get("/").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Login attempted, please try again later");
}

#[tokio::test]
async fn test_upstream_failures_are_500() {
    let fixture = TestFixture::new();

    for error in [
        SearchError::Upstream {
            status: 503,
            body: String::new(),
        },
        SearchError::MalformedResponse("expected value".to_string()),
        SearchError::Transport("connection refused".to_string()),
        SearchError::Session(SessionError::MissingCredentials(
            "Missing credentials: rc_password".to_string(),
        )),
        SearchError::Session(SessionError::LoginFailed("no planner button".to_string())),
    ] {
        fixture.searcher().set_error(error).await;
        let response = fixture.get("/").await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body["query"], "dining");
    }

    fixture
        .searcher()
        .set_error(SearchError::Upstream {
            status: 503,
            body: String::new(),
        })
        .await;
    let response = fixture.get("/").await;
    assert_eq!(response.body["error"], "HTTP status from source: 503");
}

#[tokio::test]
async fn test_logout_route() {
    let fixture = TestFixture::new();
    fixture.broker.acquire().await.unwrap();

    let response = fixture.get("/logout").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, serde_json::json!({"action": "logout"}));
    assert_eq!(fixture.broker.state().await, SessionState::Unauthenticated);
    assert!(fixture
        .automation
        .visited()
        .await
        .contains(&fixtures::LOGOUT_URL.to_string()));
}

#[tokio::test]
async fn test_health_reports_session_state() {
    let fixture = TestFixture::new();

    let response = fixture.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["session"], "unauthenticated");

    fixture.broker.acquire().await.unwrap();
    let response = fixture.get("/health").await;
    assert_eq!(response.body["session"], "authenticated");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new();

    let response = fixture.get("/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 5000);
    assert_eq!(response.body["feed"]["item_limit"], 22);
    assert!(!response.body.to_string().contains("hunter2"));
}

#[tokio::test]
async fn test_metrics_route() {
    let fixture = TestFixture::new();
    fixture.get("/health").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    let text = response.body.as_str().unwrap();
    assert!(text.contains("cruisefeed_http_requests_total"));
}

#[tokio::test]
async fn test_expired_session_renewed_through_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cruiseplanner/api/browseCatalog/1031"))
        .and(header_eq("cookie", "JSESSIONIDPCP=session-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cruiseplanner/api/browseCatalog/1031"))
        .and(header_eq("cookie", "JSESSIONIDPCP=session-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixtures::catalog_json(5)))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestFixture::with_upstream(&format!("{}/cruiseplanner/", server.uri()));
    let response = fixture.get("/search?query=entertainment").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["items"].as_array().unwrap().len(), 5);
    assert_eq!(fixture.automation.login_count(), 2);
    assert_eq!(
        fixture.get("/health").await.body["session"],
        "authenticated"
    );
}

#[tokio::test]
async fn test_repeated_401_through_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let fixture = TestFixture::with_upstream(&format!("{}/cruiseplanner/", server.uri()));
    let response = fixture.get("/").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["query"], "dining");
}
