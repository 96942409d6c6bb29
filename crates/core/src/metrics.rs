//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Session broker (login attempts and their duration)
//! - Upstream catalog search (requests by outcome, retries)
//! - Feed assembly (items published)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Session Broker Metrics
// =============================================================================

/// Login sequences run, by result.
pub static LOGIN_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cruisefeed_login_attempts_total", "Total login sequences run"),
        &["result"], // "success", "rate_limited", "failed", "missing_credentials", "aborted"
    )
    .unwrap()
});

/// Login sequence duration in seconds.
pub static LOGIN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cruisefeed_login_duration_seconds",
            "Duration of login sequences",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Upstream Search Metrics
// =============================================================================

/// Upstream catalog requests, by outcome.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cruisefeed_upstream_requests_total",
            "Total catalog search requests sent upstream",
        ),
        &["outcome"], // "success", "auth_expired", "upstream_error", "malformed", "transport"
    )
    .unwrap()
});

/// Upstream catalog request duration in seconds.
pub static UPSTREAM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cruisefeed_upstream_duration_seconds",
            "Duration of catalog search requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Searches retried after the session was rejected.
pub static SESSION_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cruisefeed_session_retries_total",
        "Searches retried after an expired session",
    )
    .unwrap()
});

// =============================================================================
// Feed Metrics
// =============================================================================

/// Feed items published.
pub static FEED_ITEMS_PUBLISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cruisefeed_feed_items_published_total",
            "Total feed items published",
        ),
        &["category"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Session
        Box::new(LOGIN_ATTEMPTS.clone()),
        Box::new(LOGIN_DURATION.clone()),
        // Upstream
        Box::new(UPSTREAM_REQUESTS.clone()),
        Box::new(UPSTREAM_DURATION.clone()),
        Box::new(SESSION_RETRIES.clone()),
        // Feed
        Box::new(FEED_ITEMS_PUBLISHED.clone()),
    ]
}
