//! Types for browser automation.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

/// Deadlines past this are clamped here instead of overflowing.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `after` from now, saturating at a far-future instant.
pub fn deadline_after(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Finds an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Id(String),
    Class(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// CSS selector equivalent.
    pub fn css(&self) -> String {
        match self {
            Self::Id(id) => format!("#{}", id),
            Self::Class(class) => format!(".{}", class),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

/// A wait that polls a condition until it holds or the timeout elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl BoundedWait {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Poll `probe` until it yields a value.
    ///
    /// The probe always runs at least once. Probe errors abort the wait.
    pub async fn until<T, F, Fut>(&self, what: &str, mut probe: F) -> Result<T, AutomationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, AutomationError>>,
    {
        let deadline = deadline_after(self.timeout);
        loop {
            if let Some(value) = probe().await? {
                return Ok(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(AutomationError::Timeout {
                    what: what.to_string(),
                    after: self.timeout,
                });
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

/// Errors from the automation driver.
#[derive(Debug, Clone, Error)]
pub enum AutomationError {
    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser action failed: {0}")]
    Action(String),

    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },
}

impl AutomationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Browser capabilities used by the login sequence.
#[async_trait]
pub trait Automation: Send + Sync {
    /// Driver name for logging.
    fn name(&self) -> &str;

    /// Load a URL in the session's page.
    async fn navigate(&self, url: &str) -> Result<(), AutomationError>;

    /// Whether an element matching `locator` is on the current page.
    async fn is_present(&self, locator: &Locator) -> Result<bool, AutomationError>;

    /// Type text into an element.
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), AutomationError>;

    /// Click an element.
    async fn click(&self, locator: &Locator) -> Result<(), AutomationError>;

    /// Read a cookie value visible to the current page.
    async fn cookie(&self, name: &str) -> Result<Option<String>, AutomationError>;

    /// Wait until an element is present.
    async fn wait_for_element(
        &self,
        locator: &Locator,
        wait: BoundedWait,
    ) -> Result<(), AutomationError> {
        wait.until(&format!("element {}", locator), move || async move {
            let present = self.is_present(locator).await?;
            Ok::<_, AutomationError>(present.then_some(()))
        })
        .await
    }

    /// Wait until a cookie is set and return its value.
    async fn wait_for_cookie(
        &self,
        name: &str,
        wait: BoundedWait,
    ) -> Result<String, AutomationError> {
        wait.until(&format!("cookie {}", name), move || async move {
            self.cookie(name).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn wait(timeout_ms: u64, poll_ms: u64) -> BoundedWait {
        BoundedWait::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_ms),
        )
    }

    #[test]
    fn test_locator_css() {
        assert_eq!(Locator::id("mat-input-0").css(), "#mat-input-0");
        assert_eq!(
            Locator::class("login__submit-button").css(),
            ".login__submit-button"
        );
    }

    #[tokio::test]
    async fn test_until_returns_first_value() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let value = wait(500, 5)
            .until("third call", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, AutomationError>((n >= 3).then_some(n))
            })
            .await
            .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_deadline_after_saturates() {
        let deadline = deadline_after(Duration::MAX);
        assert!(deadline > Instant::now() + Duration::from_secs(86400 * 365));

        let value = BoundedWait::new(Duration::MAX, Duration::from_millis(5))
            .until("immediate", || async { Ok::<_, AutomationError>(Some(7)) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_until_times_out() {
        let err = wait(30, 5)
            .until("never", || async { Ok::<Option<()>, AutomationError>(None) })
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("never"));
    }

    #[tokio::test]
    async fn test_until_probes_once_with_zero_timeout() {
        let value = wait(0, 5)
            .until("immediate", || async { Ok::<_, AutomationError>(Some(7)) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_until_propagates_probe_error() {
        let err = wait(500, 5)
            .until("broken", || async {
                Err::<Option<()>, _>(AutomationError::Action("boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(!err.is_timeout());
        assert!(matches!(err, AutomationError::Action(_)));
    }
}
