use std::time::Duration;

use thiserror::Error;

use crate::searcher::SearchError;
use crate::session::SessionError;

/// A failed feed request, tagged with the query that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{query}\" - {kind}")]
pub struct FeedError {
    pub query: String,
    pub kind: FeedErrorKind,
}

impl FeedError {
    pub fn new(query: impl Into<String>, kind: FeedErrorKind) -> Self {
        Self {
            query: query.into(),
            kind,
        }
    }
}

/// What went wrong, independent of how it is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedErrorKind {
    #[error("Errors found: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{0}")]
    Configuration(String),

    #[error("Login attempted, please try again later")]
    AuthExpired,

    #[error("Rate limit hit, try again in {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("HTTP status from source: {status}")]
    Upstream { status: u16 },

    #[error("malformed JSON response")]
    MalformedResponse,

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    LoginFailed(String),
}

impl FeedErrorKind {
    /// Short name for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::AuthExpired => "auth_expired",
            Self::RateLimited { .. } => "rate_limited",
            Self::Upstream { .. } => "upstream",
            Self::MalformedResponse => "malformed",
            Self::Transport(_) => "transport",
            Self::LoginFailed(_) => "login_failed",
        }
    }
}

impl From<SessionError> for FeedErrorKind {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingCredentials(_) => Self::Configuration(err.to_string()),
            SessionError::RateLimited { retry_after } => Self::RateLimited { retry_after },
            SessionError::LoginFailed(_) => Self::LoginFailed(err.to_string()),
        }
    }
}

impl From<SearchError> for FeedErrorKind {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Session(e) => e.into(),
            SearchError::AuthExpired => Self::AuthExpired,
            SearchError::Upstream { status, .. } => Self::Upstream { status },
            SearchError::MalformedResponse(_) => Self::MalformedResponse,
            SearchError::Transport(message) => Self::Transport(message),
        }
    }
}
