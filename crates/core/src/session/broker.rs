//! Session broker state machine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::automation::{deadline_after, Automation, AutomationError, BoundedWait, Locator};
use crate::config::{Config, LoginSelectors, SecretsConfig};
use crate::metrics::{LOGIN_ATTEMPTS, LOGIN_DURATION};
use crate::secrets::{Credentials, SecretProvider};

use super::{SessionError, SessionState, SessionToken};

type LoginOutcome = Result<SessionToken, SessionError>;

/// Runtime settings for the broker and its login sequence.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub signin_url: String,
    pub logout_url: String,
    /// Wait for interactive form elements.
    pub short_wait: BoundedWait,
    /// Wait for page loads and the session cookie.
    pub long_wait: BoundedWait,
    pub lockout_cooldown: Duration,
    pub session_cookie: String,
    pub access_cookie: String,
    pub selectors: LoginSelectors,
    pub secrets: SecretsConfig,
}

impl BrokerSettings {
    pub fn from_config(config: &Config) -> Self {
        let session = &config.session;
        let poll = Duration::from_millis(session.poll_interval_ms);
        Self {
            signin_url: config.upstream.signin_url.clone(),
            logout_url: config.upstream.logout_url(),
            short_wait: BoundedWait::new(Duration::from_secs(session.short_wait_secs), poll),
            long_wait: BoundedWait::new(Duration::from_secs(session.long_wait_secs), poll),
            lockout_cooldown: Duration::from_secs(session.lockout_cooldown_secs),
            session_cookie: session.session_cookie.clone(),
            access_cookie: session.access_cookie.clone(),
            selectors: session.selectors.clone(),
            secrets: config.secrets.clone(),
        }
    }
}

/// Internal state. Mirrors `SessionState`, but an in-flight login carries the
/// channel its outcome will be published on.
enum Slot {
    Unauthenticated,
    Authenticating(watch::Receiver<Option<LoginOutcome>>),
    Authenticated(SessionToken),
    RateLimited(Instant),
}

struct BrokerInner {
    settings: BrokerSettings,
    automation: Arc<dyn Automation>,
    secrets: Arc<dyn SecretProvider>,
    slot: Mutex<Slot>,
}

/// Owner of the single authenticated shop session.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionBroker {
    inner: Arc<BrokerInner>,
}

impl SessionBroker {
    /// Create a broker in the `Unauthenticated` state.
    ///
    /// Fails with `MissingCredentials` if the account secrets are not
    /// available. That is a configuration error and is not retried.
    pub fn new(
        settings: BrokerSettings,
        automation: Arc<dyn Automation>,
        secrets: Arc<dyn SecretProvider>,
    ) -> Result<Self, SessionError> {
        Credentials::load(secrets.as_ref(), &settings.secrets)
            .map_err(|e| SessionError::MissingCredentials(e.to_string()))?;

        info!(driver = automation.name(), "Session broker started");

        Ok(Self {
            inner: Arc::new(BrokerInner {
                settings,
                automation,
                secrets,
                slot: Mutex::new(Slot::Unauthenticated),
            }),
        })
    }

    /// Get the session token, logging in if needed.
    ///
    /// Concurrent callers share one login sequence. The sequence runs on its
    /// own task: a caller that stops waiting does not cancel it, and its
    /// outcome still lands in the broker for later callers.
    pub async fn acquire(&self) -> Result<SessionToken, SessionError> {
        let mut slot = self.inner.slot.lock().await;
        let outcome = match &*slot {
            Slot::Authenticated(token) => return Ok(token.clone()),
            Slot::RateLimited(until) if Instant::now() < *until => {
                let retry_after = until.saturating_duration_since(Instant::now());
                debug!(retry_after_secs = retry_after.as_secs(), "Session is rate limited");
                return Err(SessionError::RateLimited { retry_after });
            }
            Slot::Authenticating(outcome) if outcome.has_changed().is_err() => {
                warn!("Previous login task ended without an outcome, starting over");
                self.begin_login(&mut slot)
            }
            Slot::Authenticating(outcome) => {
                debug!("Login already in progress, waiting for it");
                outcome.clone()
            }
            Slot::RateLimited(_) | Slot::Unauthenticated => self.begin_login(&mut slot),
        };
        drop(slot);

        wait_for_outcome(outcome).await
    }

    /// Drop the session after the shop rejected `token`.
    ///
    /// Only applies while the broker still holds that same token: an
    /// in-flight login, a newer session or a lockout are left untouched.
    /// Returns whether the session was dropped.
    pub async fn invalidate(&self, token: &SessionToken) -> bool {
        let mut slot = self.inner.slot.lock().await;
        match &*slot {
            Slot::Authenticated(current) if current == token => {
                *slot = Slot::Unauthenticated;
                info!("Session invalidated");
                true
            }
            _ => {
                debug!("Ignoring invalidation of a session that is no longer current");
                false
            }
        }
    }

    /// Log out of the booking system to free a seat on its concurrent
    /// session cap.
    ///
    /// Best effort: driver errors are logged, never returned. Runs outside
    /// the login section, so it may race an in-flight request; that request
    /// sees a 401 and re-authenticates.
    pub async fn logout(&self) {
        let url = &self.inner.settings.logout_url;
        match self.inner.automation.navigate(url).await {
            Ok(()) => debug!(url = %url, "Navigated to logout"),
            Err(e) => warn!(error = %e, "Logout navigation failed"),
        }

        let mut slot = self.inner.slot.lock().await;
        if matches!(*slot, Slot::Authenticated(_)) {
            *slot = Slot::Unauthenticated;
        }
        info!("Logged out of booking system");
    }

    /// Current state snapshot.
    pub async fn state(&self) -> SessionState {
        match &*self.inner.slot.lock().await {
            Slot::Unauthenticated => SessionState::Unauthenticated,
            Slot::Authenticating(_) => SessionState::Authenticating,
            Slot::Authenticated(token) => SessionState::Authenticated {
                token: token.clone(),
            },
            Slot::RateLimited(until) => SessionState::RateLimited { until: *until },
        }
    }

    /// Move to `Authenticating` and start the login task.
    ///
    /// Called with the slot lock held, which is what makes the transition
    /// atomic for concurrent callers.
    fn begin_login(&self, slot: &mut Slot) -> watch::Receiver<Option<LoginOutcome>> {
        let (tx, rx) = watch::channel(None);
        *slot = Slot::Authenticating(rx.clone());

        let inner = Arc::clone(&self.inner);
        let login = tokio::spawn(async move {
            inner.run_login(tx).await;
        });

        // A login task that dies must not leave the slot stuck in Authenticating.
        let inner = Arc::clone(&self.inner);
        let watched = rx.clone();
        tokio::spawn(async move {
            if let Err(e) = login.await {
                error!(error = %e, "Login task aborted");
                LOGIN_ATTEMPTS.with_label_values(&["aborted"]).inc();
                inner.abandon_login(&watched).await;
            }
        });

        rx
    }
}

async fn wait_for_outcome(mut outcome: watch::Receiver<Option<LoginOutcome>>) -> LoginOutcome {
    match outcome.wait_for(Option::is_some).await {
        Ok(published) => (*published).clone().unwrap_or_else(|| {
            Err(SessionError::LoginFailed("login outcome missing".to_string()))
        }),
        Err(_) => Err(SessionError::LoginFailed(
            "login task ended without an outcome".to_string(),
        )),
    }
}

impl BrokerInner {
    /// Run the login sequence, store its result, then publish it.
    async fn run_login(&self, tx: watch::Sender<Option<LoginOutcome>>) {
        info!("Starting login sequence");
        let started = std::time::Instant::now();

        let outcome = self.login_sequence().await;

        let result = match &outcome {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        LOGIN_ATTEMPTS.with_label_values(&[result]).inc();
        LOGIN_DURATION
            .with_label_values(&[result])
            .observe(started.elapsed().as_secs_f64());

        {
            let mut slot = self.slot.lock().await;
            *slot = match &outcome {
                Ok(token) => Slot::Authenticated(token.clone()),
                Err(SessionError::RateLimited { retry_after }) => {
                    Slot::RateLimited(deadline_after(*retry_after))
                }
                Err(_) => Slot::Unauthenticated,
            };
        }

        match &outcome {
            Ok(_) => info!("Session cookie set"),
            Err(e) => error!(error = %e, "Login sequence failed"),
        }

        tx.send_replace(Some(outcome));
    }

    /// Reset the slot after the login publishing on `outcome` died.
    async fn abandon_login(&self, outcome: &watch::Receiver<Option<LoginOutcome>>) {
        let mut slot = self.slot.lock().await;
        if let Slot::Authenticating(current) = &*slot {
            if current.same_channel(outcome) {
                *slot = Slot::Unauthenticated;
                warn!("Abandoned login, session reset");
            }
        }
    }

    async fn login_sequence(&self) -> LoginOutcome {
        let settings = &self.settings;
        let credentials = Credentials::load(self.secrets.as_ref(), &settings.secrets)
            .map_err(|e| SessionError::MissingCredentials(e.to_string()))?;
        let automation = self.automation.as_ref();
        let selectors = &settings.selectors;

        automation
            .navigate(&settings.signin_url)
            .await
            .map_err(login_failed)?;
        debug!("Browser on accounts page");

        let signed_in = automation
            .cookie(&settings.access_cookie)
            .await
            .map_err(login_failed)?
            .is_some();

        if signed_in {
            debug!("Account already signed in, skipping credentials");
        } else {
            self.submit_credentials(&credentials, selectors).await?;
        }

        let planner = Locator::id(&selectors.planner_id);
        automation
            .wait_for_element(&planner, settings.long_wait)
            .await
            .map_err(login_failed)?;
        automation.click(&planner).await.map_err(login_failed)?;
        debug!("Clicked into the cruise planner");

        match automation
            .wait_for_cookie(&settings.session_cookie, settings.long_wait)
            .await
        {
            Ok(value) => {
                debug!("Obtained session cookie");
                Ok(SessionToken::new(&settings.session_cookie, value))
            }
            // The booking system withholds the cookie while it has us locked out.
            Err(e) if e.is_timeout() => {
                error!(
                    cooldown_secs = settings.lockout_cooldown.as_secs(),
                    "Failed to obtain session cookie, assuming lockout"
                );
                Err(SessionError::RateLimited {
                    retry_after: settings.lockout_cooldown,
                })
            }
            Err(e) => Err(login_failed(e)),
        }
    }

    async fn submit_credentials(
        &self,
        credentials: &Credentials,
        selectors: &LoginSelectors,
    ) -> Result<(), SessionError> {
        let automation = self.automation.as_ref();
        let short = self.settings.short_wait;

        let username = Locator::id(&selectors.username_id);
        let password = Locator::id(&selectors.password_id);
        automation
            .wait_for_element(&username, self.settings.long_wait)
            .await
            .map_err(login_failed)?;
        automation
            .wait_for_element(&password, short)
            .await
            .map_err(login_failed)?;
        automation
            .type_text(&username, &credentials.username)
            .await
            .map_err(login_failed)?;
        automation
            .type_text(&password, &credentials.password)
            .await
            .map_err(login_failed)?;
        debug!("Entered credentials");

        let remember = Locator::class(&selectors.remember_class);
        automation
            .wait_for_element(&remember, short)
            .await
            .map_err(login_failed)?;
        automation.click(&remember).await.map_err(login_failed)?;
        debug!("Checked \"Stay signed in\"");

        let submit = Locator::class(&selectors.submit_class);
        automation
            .wait_for_element(&submit, short)
            .await
            .map_err(login_failed)?;
        automation.click(&submit).await.map_err(login_failed)?;
        debug!("Clicked \"Sign in\"");

        Ok(())
    }
}

fn login_failed(e: AutomationError) -> SessionError {
    SessionError::LoginFailed(e.to_string())
}
