use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use cruisefeed_core::SanitizedConfig;
use tracing::info;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Session broker state, e.g. `authenticated`.
    pub session: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        session: state.broker().state().await.as_str().to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub action: String,
}

/// Log out of the booking system, freeing its session slot.
pub async fn logout(State(state): State<Arc<AppState>>) -> Json<LogoutResponse> {
    info!("Logout requested");
    state.broker().logout().await;
    Json(LogoutResponse {
        action: "logout".to_string(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
