use reqwest::Url;

use super::{types::Config, ConfigError};

/// Upper bound for login waits, in seconds.
const MAX_WAIT_SECS: u64 = 10 * 60;

/// Upper bound for the lockout cooldown, in seconds.
const MAX_COOLDOWN_SECS: u64 = 24 * 60 * 60;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upstream URLs parse and the base URL ends with a slash
/// - Feed item limit is positive
/// - Login waits are consistent and bounded
/// - Lockout cooldown is bounded
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Upstream validation
    let base = Url::parse(&config.upstream.base_url).map_err(|e| {
        ConfigError::ValidationError(format!("upstream.base_url is not a valid URL: {}", e))
    })?;
    if base.host_str().is_none() {
        return Err(ConfigError::ValidationError(
            "upstream.base_url must have a host".to_string(),
        ));
    }
    if !config.upstream.base_url.ends_with('/') {
        return Err(ConfigError::ValidationError(
            "upstream.base_url must end with '/'".to_string(),
        ));
    }
    Url::parse(&config.upstream.signin_url).map_err(|e| {
        ConfigError::ValidationError(format!("upstream.signin_url is not a valid URL: {}", e))
    })?;
    if config.upstream.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Feed validation
    if config.feed.item_limit == 0 {
        return Err(ConfigError::ValidationError(
            "feed.item_limit cannot be 0".to_string(),
        ));
    }

    // Session validation
    let session = &config.session;
    if session.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "session.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if session.short_wait_secs > session.long_wait_secs {
        return Err(ConfigError::ValidationError(format!(
            "session.short_wait_secs ({}) cannot exceed session.long_wait_secs ({})",
            session.short_wait_secs, session.long_wait_secs
        )));
    }
    if session.long_wait_secs > MAX_WAIT_SECS {
        return Err(ConfigError::ValidationError(format!(
            "session.long_wait_secs cannot exceed {}",
            MAX_WAIT_SECS
        )));
    }
    if session.lockout_cooldown_secs > MAX_COOLDOWN_SECS {
        return Err(ConfigError::ValidationError(format!(
            "session.lockout_cooldown_secs cannot exceed {}",
            MAX_COOLDOWN_SECS
        )));
    }
    if session.session_cookie.is_empty() {
        return Err(ConfigError::ValidationError(
            "session.session_cookie cannot be empty".to_string(),
        ));
    }

    Ok(())
}
