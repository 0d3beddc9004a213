//! Login manager with ticket lifecycle handling
//!
//! Manages the authentication protocol:
//! - Ticket retrieval from the [`TicketStore`]
//! - Login against the ticket endpoint when no valid ticket exists
//! - Forced reauthentication, at most once per [`ReauthState`] cycle
//! - Auth header computation (`Authorization` + `Date`)
//!
//! Concurrent callers that all find the store empty perform a single login:
//! the login call runs behind an async mutex and the store is re-checked
//! once the lock is held.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, DATE};
use http::Method;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ticket_store::TicketStore;
use super::types::{
    http_date, Credentials, ReauthState, Ticket, DEFAULT_TICKET_HEADER,
    DEFAULT_TICKET_LIFETIME_SECS, DEFAULT_TICKET_SCHEME,
};
use crate::error::{ApiClientError, Result};
use crate::http::{HttpResponse, RequestExecutor};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// JSON body fields that may carry the ticket, in lookup order
const TICKET_BODY_FIELDS: [&str; 2] = ["ticket", "tgt"];

/// Settings for the login protocol
#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Absolute URL of the ticket endpoint
    pub login_url: String,

    pub credentials: Credentials,

    /// `Authorization` scheme placed before the ticket
    pub scheme: String,

    /// Response header carrying the ticket
    pub ticket_header: String,

    /// How long issued tickets are considered valid; `None` trusts the
    /// ticket until the server rejects it
    pub ticket_lifetime: Option<Duration>,
}

impl LoginConfig {
    /// Create a config with the default scheme, header and lifetime.
    pub fn new(login_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            login_url: login_url.into(),
            credentials,
            scheme: DEFAULT_TICKET_SCHEME.to_string(),
            ticket_header: DEFAULT_TICKET_HEADER.to_string(),
            ticket_lifetime: Some(Duration::from_secs(DEFAULT_TICKET_LIFETIME_SECS)),
        }
    }
}

/// Owns the ticket and the login protocol
pub struct LoginManager {
    executor: RequestExecutor,
    config: LoginConfig,
    store: TicketStore,
    login_lock: Mutex<()>,
}

impl LoginManager {
    /// Create a new login manager
    ///
    /// # Arguments
    /// * `executor` - Executes the login call
    /// * `config` - Login endpoint, credentials and ticket settings
    /// * `store` - Where tickets are kept between calls
    #[must_use]
    pub fn new(executor: RequestExecutor, config: LoginConfig, store: TicketStore) -> Self {
        Self { executor, config, store, login_lock: Mutex::new(()) }
    }

    pub fn config(&self) -> &LoginConfig {
        &self.config
    }

    /// Current valid ticket, without logging in.
    pub async fn ticket(&self) -> Option<Arc<Ticket>> {
        self.store.get().await
    }

    /// Check if a valid ticket is available
    pub async fn is_authenticated(&self) -> bool {
        self.store.get().await.is_some()
    }

    /// Obtain a new ticket from the login endpoint, replacing the current one.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Authentication`] if the endpoint answers with
    /// a non-2xx status, the response carries no ticket, or the call fails.
    pub async fn login(&self) -> Result<Arc<Ticket>> {
        let _guard = self.login_lock.lock().await;
        self.request_ticket().await
    }

    /// Force a new login, at most once per `state` cycle.
    ///
    /// `rejected` is the ticket the failed request carried. If another task
    /// already replaced it, the replacement is returned without a login. A
    /// second call with the same state is a no-op that returns the ticket
    /// already held, even if the server rejected it.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Authentication`] if the login call fails.
    pub async fn re_authenticate(
        &self,
        state: &mut ReauthState,
        rejected: &Arc<Ticket>,
    ) -> Result<Arc<Ticket>> {
        if state.is_re_auth_attempted() {
            debug!("reauthentication already attempted in this call");
            return match self.store.current() {
                Some(ticket) => Ok(ticket),
                None => self.ensure_ticket().await,
            };
        }

        state.mark_attempted();
        let _guard = self.login_lock.lock().await;

        if let Some(current) = self.store.current() {
            if !Arc::ptr_eq(rejected, &current) && !current.is_expired() {
                debug!("rejected ticket already replaced");
                return Ok(current);
            }
        }

        info!(username = %self.config.credentials.username, "reauthenticating");
        self.request_ticket().await
    }

    /// Return the current ticket, logging in when there is none.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Authentication`] if a required login fails.
    pub async fn ensure_ticket(&self) -> Result<Arc<Ticket>> {
        if let Some(ticket) = self.store.get().await {
            return Ok(ticket);
        }

        let _guard = self.login_lock.lock().await;
        if let Some(ticket) = self.store.get().await {
            return Ok(ticket);
        }

        self.request_ticket().await
    }

    /// Headers that authenticate a request: `Authorization` and `Date`.
    ///
    /// Logs in first if no valid ticket exists. `Date` is computed at call
    /// time even when the ticket is reused.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Authentication`] if login fails or the
    /// ticket cannot be encoded as a header value.
    pub async fn auth_headers(&self) -> Result<HeaderMap> {
        let ticket = self.ensure_ticket().await?;
        Self::headers_for_ticket(&ticket)
    }

    /// Auth headers for a specific ticket, with `Date` set to now.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Authentication`] if the ticket cannot be
    /// encoded as a header value.
    pub fn headers_for_ticket(ticket: &Ticket) -> Result<HeaderMap> {
        let authorization = authorization_header(ticket)?;
        let date = HeaderValue::from_str(&http_date(Utc::now())).map_err(|err| {
            ApiClientError::Authentication {
                message: "date is not a valid header value".to_string(),
                code: None,
                source: Some(Box::new(err)),
            }
        })?;

        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(DATE, date);
        Ok(headers)
    }

    /// Perform the login call. Callers must hold `login_lock`.
    async fn request_ticket(&self) -> Result<Arc<Ticket>> {
        let url = &self.config.login_url;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &self.config.credentials.username)
            .append_pair("password", &self.config.credentials.password)
            .finish();

        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        let response = self
            .executor
            .execute(Method::POST, url, &headers, Some(body.into()))
            .await
            .map_err(|err| match err {
                ApiClientError::Transport { message, code, source } => {
                    warn!(url = %url, error = %message, "login request failed");
                    ApiClientError::Authentication {
                        message: format!("login request to {url} failed: {message}"),
                        code,
                        source,
                    }
                }
                other => other,
            })?;

        if !response.is_success() {
            let status = response.status();
            warn!(url = %url, %status, "login rejected");
            return Err(ApiClientError::authentication_status(
                status.as_u16(),
                format!("{url} returned status {status}"),
            ));
        }

        let value = extract_ticket(&response, &self.config.ticket_header).ok_or_else(|| {
            ApiClientError::authentication(format!("login response from {url} carried no ticket"))
        })?;

        let ticket = Ticket::new(value, self.config.scheme.clone(), self.config.ticket_lifetime);
        // Never store a ticket that cannot be sent
        if let Err(err) = authorization_header(&ticket) {
            warn!(url = %url, "login returned a ticket that is not a valid header value");
            return Err(err);
        }
        let ticket = self.store.put(ticket).await;

        info!(username = %self.config.credentials.username, "login successful");
        Ok(ticket)
    }
}

impl std::fmt::Debug for LoginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginManager")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn authorization_header(ticket: &Ticket) -> Result<HeaderValue> {
    HeaderValue::from_str(&ticket.authorization_value()).map_err(|err| {
        ApiClientError::Authentication {
            message: "ticket is not a valid header value".to_string(),
            code: None,
            source: Some(Box::new(err)),
        }
    })
}

/// Pull the ticket out of a successful login response.
///
/// Looks at the ticket header first, then a `ticket`/`tgt` field of a JSON
/// body, then the plain-text body.
fn extract_ticket(response: &HttpResponse, ticket_header: &str) -> Option<String> {
    if let Some(value) = response.header(ticket_header).and_then(non_empty) {
        return Some(value);
    }

    match serde_json::from_slice::<serde_json::Value>(&response.body) {
        Ok(serde_json::Value::String(value)) => return non_empty(&value),
        Ok(serde_json::Value::Object(fields)) => {
            return TICKET_BODY_FIELDS
                .iter()
                .find_map(|field| fields.get(*field).and_then(serde_json::Value::as_str))
                .and_then(non_empty);
        }
        _ => {}
    }

    non_empty(&response.text())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
