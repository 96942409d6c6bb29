//! Types for the session broker.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::Instant;

/// The booking system session cookie obtained by a login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// When the login that produced this token finished.
    pub obtained_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            obtained_at: Utc::now(),
        }
    }

    /// `name=value` as sent in a `Cookie` header.
    pub fn cookie_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Snapshot of the broker's state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// A login sequence is running.
    Authenticating,
    Authenticated {
        token: SessionToken,
    },
    /// The shop locked out the booking system until `until`.
    RateLimited {
        until: Instant,
    },
}

impl SessionState {
    /// Short name for logs and health output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated { .. } => "authenticated",
            Self::RateLimited { .. } => "rate_limited",
        }
    }
}

/// Outcome of a failed `acquire`.
///
/// Cloneable because one login outcome is delivered to every waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Login credentials not configured: {0}")]
    MissingCredentials(String),

    #[error("Rate limit hit, try again in {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Login failed: {0}")]
    LoginFailed(String),
}

impl SessionError {
    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingCredentials(_) => "missing_credentials",
            Self::RateLimited { .. } => "rate_limited",
            Self::LoginFailed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_pair() {
        let token = SessionToken::new("JSESSIONIDPCP", "abc123");
        assert_eq!(token.cookie_pair(), "JSESSIONIDPCP=abc123");
    }

    #[test]
    fn test_token_debug_redacts_value() {
        let token = SessionToken::new("JSESSIONIDPCP", "abc123");
        let debug = format!("{:?}", token);
        assert!(debug.contains("JSESSIONIDPCP"));
        assert!(!debug.contains("abc123"));
    }

    #[test]
    fn test_rate_limited_display_in_seconds() {
        let err = SessionError::RateLimited {
            retry_after: Duration::from_secs(840),
        };
        assert_eq!(err.to_string(), "Rate limit hit, try again in 840s");
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SessionState::Unauthenticated.as_str(), "unauthenticated");
        assert_eq!(SessionState::Authenticating.as_str(), "authenticating");
        assert_eq!(
            SessionState::Authenticated {
                token: SessionToken::new("a", "b")
            }
            .as_str(),
            "authenticated"
        );
    }
}
