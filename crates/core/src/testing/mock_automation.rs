//! Mock browser automation for testing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::automation::{Automation, AutomationError, Locator};
use crate::config::SessionConfig;

use super::fixtures::SIGNIN_URL;

/// Never withhold the session cookie.
const NEVER: u32 = u32::MAX;

/// Mock implementation of the `Automation` trait.
///
/// Simulates the shop's sign-in flow:
/// - every navigation to `fixtures::SIGNIN_URL` counts as one login
/// - all elements are present unless removed with `without_element`
/// - the session cookie is `session-<login count>` once a login has started,
///   unless the cookie is withheld (the shop's lockout behavior)
pub struct MockAutomation {
    session_cookie: String,
    access_cookie: String,
    signed_in: bool,
    missing: HashSet<String>,
    login_delay: Duration,
    /// Logins after this count get no session cookie.
    withhold_after: AtomicU32,
    logins: AtomicU32,
    fail_navigation: AtomicBool,
    crash_next_login: AtomicBool,
    visited: RwLock<Vec<String>>,
    typed: RwLock<Vec<(String, String)>>,
    clicks: RwLock<Vec<String>>,
}

impl std::fmt::Debug for MockAutomation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAutomation")
            .field("signed_in", &self.signed_in)
            .field("missing", &self.missing)
            .field("logins", &self.logins)
            .finish()
    }
}

impl Default for MockAutomation {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAutomation {
    /// A browser that signs in successfully with the default cookie names.
    pub fn new() -> Self {
        let session = SessionConfig::default();
        Self {
            session_cookie: session.session_cookie,
            access_cookie: session.access_cookie,
            signed_in: false,
            missing: HashSet::new(),
            login_delay: Duration::ZERO,
            withhold_after: AtomicU32::new(NEVER),
            logins: AtomicU32::new(0),
            fail_navigation: AtomicBool::new(false),
            crash_next_login: AtomicBool::new(false),
            visited: RwLock::new(Vec::new()),
            typed: RwLock::new(Vec::new()),
            clicks: RwLock::new(Vec::new()),
        }
    }

    /// The account site already has an access cookie, so no credentials are
    /// entered.
    pub fn already_signed_in(mut self) -> Self {
        self.signed_in = true;
        self
    }

    /// Never hand out the session cookie.
    pub fn withhold_session_cookie(self) -> Self {
        self.withhold_after.store(0, Ordering::SeqCst);
        self
    }

    /// Remove the element matching a CSS selector such as `#mat-input-1`.
    pub fn without_element(mut self, css: &str) -> Self {
        self.missing.insert(css.to_string());
        self
    }

    /// Make each visit to the sign-in page take `delay`.
    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    /// Hand out session cookies again.
    pub fn release_session_cookie(&self) {
        self.withhold_after.store(NEVER, Ordering::SeqCst);
    }

    /// Withhold the session cookie from logins after the first `logins`.
    pub fn withhold_session_cookie_after(&self, logins: u32) {
        self.withhold_after.store(logins, Ordering::SeqCst);
    }

    /// Make every later navigation fail.
    pub fn fail_navigation(&self) {
        self.fail_navigation.store(true, Ordering::SeqCst);
    }

    /// Panic inside the next login, as a crashed driver would.
    pub fn crash_next_login(&self) {
        self.crash_next_login.store(true, Ordering::SeqCst);
    }

    /// Number of login sequences started.
    pub fn login_count(&self) -> u32 {
        self.logins.load(Ordering::SeqCst)
    }

    /// Every URL navigated to, in order.
    pub async fn visited(&self) -> Vec<String> {
        self.visited.read().await.clone()
    }

    /// `(selector, text)` for everything typed, in order.
    pub async fn typed_text(&self) -> Vec<(String, String)> {
        self.typed.read().await.clone()
    }

    /// Selectors clicked, in order.
    pub async fn clicks(&self) -> Vec<String> {
        self.clicks.read().await.clone()
    }

    fn check_present(&self, locator: &Locator) -> Result<(), AutomationError> {
        if self.missing.contains(&locator.css()) {
            return Err(AutomationError::ElementNotFound(locator.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Automation for MockAutomation {
    fn name(&self) -> &str {
        "mock"
    }

    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        if self.fail_navigation.load(Ordering::SeqCst) {
            return Err(AutomationError::Navigation {
                url: url.to_string(),
                message: "simulated navigation failure".to_string(),
            });
        }

        self.visited.write().await.push(url.to_string());
        if url == SIGNIN_URL {
            self.logins.fetch_add(1, Ordering::SeqCst);
            if self.crash_next_login.swap(false, Ordering::SeqCst) {
                panic!("simulated driver crash");
            }
            if !self.login_delay.is_zero() {
                tokio::time::sleep(self.login_delay).await;
            }
        }
        Ok(())
    }

    async fn is_present(&self, locator: &Locator) -> Result<bool, AutomationError> {
        Ok(!self.missing.contains(&locator.css()))
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), AutomationError> {
        self.check_present(locator)?;
        self.typed
            .write()
            .await
            .push((locator.css(), text.to_string()));
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), AutomationError> {
        self.check_present(locator)?;
        self.clicks.write().await.push(locator.css());
        Ok(())
    }

    async fn cookie(&self, name: &str) -> Result<Option<String>, AutomationError> {
        if name == self.access_cookie {
            return Ok(self.signed_in.then(|| "access".to_string()));
        }
        if name == self.session_cookie {
            let logins = self.login_count();
            let withheld = logins > self.withhold_after.load(Ordering::SeqCst);
            if logins > 0 && !withheld {
                return Ok(Some(format!("session-{}", logins)));
            }
        }
        Ok(None)
    }
}
