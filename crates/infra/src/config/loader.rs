//! Configuration loader
//!
//! Loads client configuration from environment variables.
//!
//! ## Environment Variables
//! - `TICKETAUTH_LOGIN_ENDPOINT`: Absolute URL of the ticket endpoint
//! - `TICKETAUTH_AUTH_BASE`: Auth service base URL; the login endpoint is
//!   derived as `<base>/v1/tickets` when `TICKETAUTH_LOGIN_ENDPOINT` is unset
//! - `TICKETAUTH_USERNAME`: Login username
//! - `TICKETAUTH_PASSWORD`: Login password
//! - `TICKETAUTH_ENDPOINT`: Base URL of the resource API
//! - `TICKETAUTH_TICKET_LIFETIME_SECS`: Local ticket lifetime (`0` disables
//!   local expiry)
//! - `TICKETAUTH_TIMEOUT_SECS`: Request timeout of the default transport
//!
//! Missing required values are left empty so that
//! [`ClientConfig::validate`] names them on first use.

use std::time::Duration;

use super::settings::{login_endpoint_for, ClientConfig};

pub const LOGIN_ENDPOINT_VAR: &str = "TICKETAUTH_LOGIN_ENDPOINT";
pub const AUTH_BASE_VAR: &str = "TICKETAUTH_AUTH_BASE";
pub const USERNAME_VAR: &str = "TICKETAUTH_USERNAME";
pub const PASSWORD_VAR: &str = "TICKETAUTH_PASSWORD";
pub const ENDPOINT_VAR: &str = "TICKETAUTH_ENDPOINT";
pub const TICKET_LIFETIME_VAR: &str = "TICKETAUTH_TICKET_LIFETIME_SECS";
pub const TIMEOUT_VAR: &str = "TICKETAUTH_TIMEOUT_SECS";

/// Load configuration from environment variables
///
/// # Environment Variables
/// See module documentation for the complete list.
pub fn load_from_env() -> ClientConfig {
    let config = load_from_lookup(|key| std::env::var(key).ok());
    tracing::debug!(config = ?config, "Configuration loaded from environment variables");
    config
}

/// Build configuration from an arbitrary key lookup.
///
/// Empty values count as unset. Unparsable numbers are logged and replaced
/// by their defaults.
pub fn load_from_lookup<F>(lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut config = ClientConfig::default();

    config.login_endpoint = match (value(LOGIN_ENDPOINT_VAR), value(AUTH_BASE_VAR)) {
        (Some(endpoint), _) => endpoint,
        (None, Some(base)) => login_endpoint_for(&base),
        (None, None) => String::new(),
    };
    config.username = value(USERNAME_VAR).unwrap_or_default();
    config.password = value(PASSWORD_VAR).unwrap_or_default();
    config.endpoint = value(ENDPOINT_VAR).unwrap_or_default();

    let lifetime = value(TICKET_LIFETIME_VAR).and_then(|raw| parse_secs(TICKET_LIFETIME_VAR, &raw));
    if let Some(secs) = lifetime {
        config.ticket_lifetime = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(secs) = value(TIMEOUT_VAR).and_then(|raw| parse_secs(TIMEOUT_VAR, &raw)) {
        config.timeout = Duration::from_secs(secs);
    }

    config
}

fn parse_secs(key: &str, raw: &str) -> Option<u64> {
    match raw.parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(e) => {
            tracing::warn!(key, value = raw, error = %e, "Ignoring invalid number of seconds");
            None
        }
    }
}
