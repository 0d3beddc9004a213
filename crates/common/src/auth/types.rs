//! Ticket, credential and per-call reauthentication types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default `Authorization` scheme for tickets
pub const DEFAULT_TICKET_SCHEME: &str = "Boknett";

/// Default response header carrying the ticket issued by the login endpoint
pub const DEFAULT_TICKET_HEADER: &str = "Boknett-TGT";

/// Default ticket lifetime (115 minutes)
pub const DEFAULT_TICKET_LIFETIME_SECS: u64 = 115 * 60;

/// `strftime` pattern for IMF-fixdate (RFC 1123 HTTP-date)
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an HTTP `Date` header value.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

/// Authentication ticket issued by the login endpoint
///
/// Tickets are immutable once issued; a successful login replaces the
/// current ticket with a new one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Opaque credential string
    pub value: String,

    /// Scheme used in the `Authorization` header (e.g. `Boknett`)
    pub scheme: String,

    /// When the ticket was issued
    pub issued_at: DateTime<Utc>,

    /// When the ticket stops being usable; `None` means no known expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Create a ticket issued now.
    ///
    /// # Arguments
    /// * `value` - Ticket string returned by the login endpoint
    /// * `scheme` - `Authorization` scheme
    /// * `lifetime` - How long the ticket stays valid, if known
    #[must_use]
    pub fn new(
        value: impl Into<String>,
        scheme: impl Into<String>,
        lifetime: Option<std::time::Duration>,
    ) -> Self {
        let issued_at = Utc::now();
        let expires_at = lifetime
            .and_then(|lifetime| chrono::Duration::from_std(lifetime).ok())
            .map(|lifetime| issued_at + lifetime);

        Self { value: value.into(), scheme: scheme.into(), issued_at, expires_at }
    }

    /// `Authorization` header value: `<scheme> <ticket>`.
    #[must_use]
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.scheme, self.value)
    }

    /// Check if the ticket has passed its expiry time
    ///
    /// Tickets without an expiry never expire locally; the server still
    /// decides by answering 401.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Time left before expiry, `None` when no expiry is known.
    ///
    /// Returns a zero duration for expired tickets.
    #[must_use]
    pub fn remaining_lifetime(&self) -> Option<std::time::Duration> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).to_std().unwrap_or_default())
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("value", &"[REDACTED]")
            .field("scheme", &self.scheme)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Username/password pair posted to the login endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Whether a reauthentication was already attempted in the current call
///
/// Created fresh by each top-level request and threaded through its retry
/// logic, so one call's reauthentication never suppresses another's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReauthState {
    attempted: bool,
}

impl ReauthState {
    /// State for a new call: no reauthentication attempted yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this call already reauthenticated.
    #[must_use]
    pub fn is_re_auth_attempted(&self) -> bool {
        self.attempted
    }

    /// Record that this call has used its reauthentication.
    pub fn mark_attempted(&mut self) {
        self.attempted = true;
    }

    /// Start a new cycle, allowing one more reauthentication.
    pub fn reset(&mut self) {
        self.attempted = false;
    }
}
