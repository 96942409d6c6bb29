use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

/// Cruise planner shop endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Shop base URL, with trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Catalog search endpoint, relative to `base_url`.
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,
    /// Browse page prefix, relative to `base_url`. Used for feed links.
    #[serde(default = "default_browse_endpoint")]
    pub browse_endpoint: String,
    /// Logout endpoint, relative to `base_url`.
    #[serde(default = "default_logout_endpoint")]
    pub logout_endpoint: String,
    /// Account sign-in page the login sequence starts from.
    #[serde(default = "default_signin_url")]
    pub signin_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_endpoint: default_search_endpoint(),
            browse_endpoint: default_browse_endpoint(),
            logout_endpoint: default_logout_endpoint(),
            signin_url: default_signin_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl UpstreamConfig {
    pub fn search_url(&self, upstream_id: &str) -> String {
        format!("{}{}{}", self.base_url, self.search_endpoint, upstream_id)
    }

    pub fn browse_url(&self, upstream_id: &str) -> String {
        format!("{}{}{}", self.base_url, self.browse_endpoint, upstream_id)
    }

    pub fn logout_url(&self) -> String {
        format!("{}{}", self.base_url, self.logout_endpoint)
    }
}

fn default_base_url() -> String {
    "https://secure.royalcaribbean.com/cruiseplanner/".to_string()
}

fn default_search_endpoint() -> String {
    "api/browseCatalog/".to_string()
}

fn default_browse_endpoint() -> String {
    "category/".to_string()
}

fn default_logout_endpoint() -> String {
    "logout".to_string()
}

fn default_signin_url() -> String {
    "https://www.royalcaribbean.com/account/signin/".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; rv:78.0) Gecko/20100101 Firefox/78.0".to_string()
}

/// Login sequence and session lifecycle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Wait for interactive form elements, in seconds.
    #[serde(default = "default_short_wait")]
    pub short_wait_secs: u64,
    /// Wait for page loads, the post-login redirect and the session cookie, in seconds.
    #[serde(default = "default_long_wait")]
    pub long_wait_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// How long the shop locks out the booking system after a failed login.
    #[serde(default = "default_lockout_cooldown")]
    pub lockout_cooldown_secs: u64,
    /// Cookie carrying the booking system session.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Cookie set by the account site once signed in.
    #[serde(default = "default_access_cookie")]
    pub access_cookie: String,
    #[serde(default)]
    pub selectors: LoginSelectors,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            short_wait_secs: default_short_wait(),
            long_wait_secs: default_long_wait(),
            poll_interval_ms: default_poll_interval(),
            lockout_cooldown_secs: default_lockout_cooldown(),
            session_cookie: default_session_cookie(),
            access_cookie: default_access_cookie(),
            selectors: LoginSelectors::default(),
        }
    }
}

fn default_short_wait() -> u64 {
    3
}

fn default_long_wait() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_lockout_cooldown() -> u64 {
    15 * 60
}

fn default_session_cookie() -> String {
    "JSESSIONIDPCP".to_string()
}

fn default_access_cookie() -> String {
    "accessToken".to_string()
}

/// Element lookups used by the login sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoginSelectors {
    /// Element id of the username field.
    pub username_id: String,
    /// Element id of the password field.
    pub password_id: String,
    /// Class of the "stay signed in" checkbox.
    pub remember_class: String,
    /// Class of the sign-in button.
    pub submit_class: String,
    /// Element id of the "Plan my cruise" button.
    pub planner_id: String,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            username_id: "mat-input-0".to_string(),
            password_id: "mat-input-1".to_string(),
            remember_class: "mat-checkbox-inner-container".to_string(),
            submit_class: "login__submit-button".to_string(),
            planner_id: "cruisePlannerButton".to_string(),
        }
    }
}

/// Feed output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Maximum items per feed.
    #[serde(default = "default_item_limit")]
    pub item_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            item_limit: default_item_limit(),
        }
    }
}

fn default_item_limit() -> usize {
    22
}

/// Where credentials are read from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecretsConfig {
    /// Docker secrets directory. Environment variables are the fallback.
    #[serde(default = "default_secrets_dir")]
    pub dir: PathBuf,
    /// Secret name holding the account username.
    #[serde(default = "default_username_secret")]
    pub username: String,
    /// Secret name holding the account password.
    #[serde(default = "default_password_secret")]
    pub password: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            dir: default_secrets_dir(),
            username: default_username_secret(),
            password: default_password_secret(),
        }
    }
}

fn default_secrets_dir() -> PathBuf {
    PathBuf::from("/run/secrets")
}

fn default_username_secret() -> String {
    "rc_username".to_string()
}

fn default_password_secret() -> String {
    "rc_password".to_string()
}

/// Headless browser settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Chromium executable. Auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            executable: None,
        }
    }
}

fn default_headless() -> bool {
    true
}

/// Sanitized config for API responses (secret locations only, never values)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub upstream: SanitizedUpstreamConfig,
    pub feed: FeedConfig,
    pub secrets_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            upstream: SanitizedUpstreamConfig {
                base_url: config.upstream.base_url.clone(),
                timeout_secs: config.upstream.timeout_secs,
            },
            feed: config.feed.clone(),
            secrets_dir: config.secrets.dir.clone(),
        }
    }
}
