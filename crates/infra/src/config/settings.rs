//! Client configuration and the guard that checks it before first use

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ticketauth_common::auth::{
    DEFAULT_TICKET_HEADER, DEFAULT_TICKET_LIFETIME_SECS, DEFAULT_TICKET_SCHEME,
};
use ticketauth_common::cache::{KeyValueCache, NoOpCache};
use ticketauth_common::error::{ApiClientError, Result};
use ticketauth_common::http::HttpTransport;
use ticketauth_common::observability::{NoOpRequestLogger, RequestLogger};

use crate::http::DEFAULT_TIMEOUT;

/// Path appended to the auth service base URL to reach the ticket endpoint
pub const LOGIN_PATH: &str = "/v1/tickets";

/// Configuration keys checked by [`ClientConfig::validate`], in check order
pub const LOGIN_ENDPOINT_FIELD: &str = "loginEndpoint";
pub const LOGIN_USERNAME_FIELD: &str = "loginUsername";
pub const LOGIN_PASSWORD_FIELD: &str = "loginPassword";
pub const ENDPOINT_FIELD: &str = "endpoint";

/// Everything needed to build an authenticated client
#[derive(Clone)]
pub struct ClientConfig {
    /// Absolute URL of the ticket endpoint
    pub login_endpoint: String,
    pub username: String,
    pub password: String,

    /// Base URL every request path is appended to
    pub endpoint: String,

    pub ticket_scheme: String,
    pub ticket_header: String,

    /// Local ticket lifetime; `None` keeps tickets until the server rejects them
    pub ticket_lifetime: Option<Duration>,

    /// Request timeout for the default transport
    pub timeout: Duration,

    pub cache: Arc<dyn KeyValueCache>,
    pub logger: Arc<dyn RequestLogger>,

    /// Transport override; `None` builds a [`ReqwestTransport`](crate::http::ReqwestTransport)
    pub transport: Option<Arc<dyn HttpTransport>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            login_endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            endpoint: String::new(),
            ticket_scheme: DEFAULT_TICKET_SCHEME.to_string(),
            ticket_header: DEFAULT_TICKET_HEADER.to_string(),
            ticket_lifetime: Some(Duration::from_secs(DEFAULT_TICKET_LIFETIME_SECS)),
            timeout: DEFAULT_TIMEOUT,
            cache: Arc::new(NoOpCache),
            logger: Arc::new(NoOpRequestLogger),
            transport: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set credentials and derive the login endpoint as
    /// `<auth_base>/v1/tickets`.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        auth_base: &str,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self.login_endpoint = login_endpoint_for(auth_base);
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn KeyValueCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Check that every required value is present.
    ///
    /// Fields are checked in the order login endpoint, username, password,
    /// endpoint; the error names the first one that is empty.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Configuration`] naming the missing field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (LOGIN_ENDPOINT_FIELD, &self.login_endpoint),
            (LOGIN_USERNAME_FIELD, &self.username),
            (LOGIN_PASSWORD_FIELD, &self.password),
            (ENDPOINT_FIELD, &self.endpoint),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(ApiClientError::configuration(*field)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("login_endpoint", &self.login_endpoint)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("ticket_scheme", &self.ticket_scheme)
            .field("ticket_header", &self.ticket_header)
            .field("ticket_lifetime", &self.ticket_lifetime)
            .field("timeout", &self.timeout)
            .field("logger", &self.logger)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

/// Ticket endpoint for an auth service base URL.
pub fn login_endpoint_for(auth_base: &str) -> String {
    format!("{auth_base}{LOGIN_PATH}")
}

#[cfg(test)]
mod tests {
    use ticketauth_common::error::ErrorKind;

    use super::*;

    fn complete() -> ClientConfig {
        ClientConfig::new()
            .with_credentials("user", "secret", "https://login.test")
            .with_endpoint("https://api.test")
    }

    #[test]
    fn test_credentials_derive_login_endpoint() {
        let config = complete();
        assert_eq!(config.login_endpoint, "https://login.test/v1/tickets");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_missing_field_in_order() {
        let err = ClientConfig::new().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.missing_field(), Some("loginEndpoint"));

        let mut config = complete();
        config.username.clear();
        config.endpoint.clear();
        assert_eq!(config.validate().unwrap_err().missing_field(), Some("loginUsername"));

        let mut config = complete();
        config.password = "   ".to_string();
        assert_eq!(config.validate().unwrap_err().missing_field(), Some("loginPassword"));

        let mut config = complete();
        config.endpoint.clear();
        let err = config.validate().unwrap_err();
        assert_eq!(err.missing_field(), Some("endpoint"));
        assert_eq!(err.to_string(), "Parameter \"endpoint\" has no value.");
        assert_eq!(err.code(), Some(503));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.ticket_scheme, "Boknett");
        assert_eq!(config.ticket_header, "Boknett-TGT");
        assert_eq!(config.ticket_lifetime, Some(Duration::from_secs(115 * 60)));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.transport.is_none());
        assert!(!config.logger.is_enabled());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", complete());
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("secret"));
    }
}
