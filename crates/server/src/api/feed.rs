//! Feed endpoint and error mapping.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, RawQuery, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cruisefeed_core::{
    invalid_query_message, FeedError, FeedErrorKind, JsonFeed, JSON_FEED_CONTENT_TYPE,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::metrics::FEED_ERRORS_TOTAL;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    /// Category code, e.g. `dining`.
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// GET / and /search
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            let errors = vec![
                rejection.body_text(),
                invalid_query_message(state.pipeline().registry()),
            ];
            return error_response(FeedError::new(
                raw.unwrap_or_default(),
                FeedErrorKind::Validation(errors),
            ));
        }
    };

    match state.pipeline().run(params.query.as_deref()).await {
        Ok(feed) => feed_response(&feed),
        Err(err) => error_response(err),
    }
}

fn feed_response(feed: &JsonFeed) -> Response {
    match serde_json::to_vec(feed) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, JSON_FEED_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serialize feed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// HTTP status for a feed failure.
pub fn status_for(kind: &FeedErrorKind) -> StatusCode {
    match kind {
        FeedErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
        FeedErrorKind::AuthExpired => StatusCode::UNAUTHORIZED,
        FeedErrorKind::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        FeedErrorKind::Configuration(_)
        | FeedErrorKind::Upstream { .. }
        | FeedErrorKind::MalformedResponse
        | FeedErrorKind::Transport(_)
        | FeedErrorKind::LoginFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: FeedError) -> Response {
    let status = status_for(&err.kind);
    FEED_ERRORS_TOTAL.with_label_values(&[err.kind.label()]).inc();

    if status.is_server_error() {
        error!(query = %err.query, kind = err.kind.label(), "{}", err.kind);
    } else {
        warn!(query = %err.query, kind = err.kind.label(), "{}", err.kind);
    }

    let retry_after_secs = match &err.kind {
        // Whole seconds, rounded up.
        FeedErrorKind::RateLimited { retry_after } => {
            Some(
                retry_after
                    .as_secs()
                    .saturating_add(u64::from(retry_after.subsec_nanos() > 0)),
            )
        }
        _ => None,
    };

    let body = ErrorResponse {
        error: err.kind.to_string(),
        query: err.query,
        details: match err.kind {
            FeedErrorKind::Validation(errors) => Some(errors),
            _ => None,
        },
        retry_after_secs,
    };

    let mut response = (status, Json(body)).into_response();
    if let Some(secs) = retry_after_secs {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}
