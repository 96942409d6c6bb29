use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{feed, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Feeds
        .route("/", get(feed::get_feed))
        .route("/search", get(feed::get_feed))
        // Session
        .route("/logout", get(handlers::logout))
        // Operations
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
