//! Lazily built client facade
//!
//! [`AuthenticatedApi`] collects configuration through setters and builds
//! the [`ApiClient`] on first use, after checking that every required value
//! is present. Any setter drops the built client so the next call rebuilds
//! it from the new configuration.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde::Serialize;
use ticketauth_common::auth::{
    ticket_cache_key, Credentials, LoginConfig, LoginManager, TicketStore,
};
use ticketauth_common::cache::KeyValueCache;
use ticketauth_common::error::Result;
use ticketauth_common::http::{HeaderMap, HttpResponse, HttpTransport, RequestExecutor};
use ticketauth_common::observability::RequestLogger;
use tracing::debug;

use super::client::ApiClient;
use super::request::RequestSpec;
use crate::config::{load_from_env, login_endpoint_for, ClientConfig};
use crate::http::ReqwestTransport;

/// Build an [`ApiClient`] from a validated configuration.
///
/// # Errors
/// Returns [`ApiClientError::Configuration`](ticketauth_common::ApiClientError::Configuration)
/// naming the first missing field, or a transport error if the default
/// transport cannot be created.
pub fn build_client(config: &ClientConfig) -> Result<ApiClient> {
    config.validate()?;

    let transport: Arc<dyn HttpTransport> = match &config.transport {
        Some(transport) => Arc::clone(transport),
        None => Arc::new(ReqwestTransport::builder().timeout(config.timeout).build()?),
    };
    let executor = RequestExecutor::new(transport);

    let login_config = LoginConfig {
        login_url: config.login_endpoint.clone(),
        credentials: Credentials::new(config.username.clone(), config.password.clone()),
        scheme: config.ticket_scheme.clone(),
        ticket_header: config.ticket_header.clone(),
        ticket_lifetime: config.ticket_lifetime,
    };
    let store = TicketStore::new(Arc::clone(&config.cache), ticket_cache_key(&config.username));
    let login = Arc::new(LoginManager::new(executor.clone(), login_config, store));

    debug!(
        endpoint = %config.endpoint,
        login_endpoint = %config.login_endpoint,
        "building API client"
    );
    let client = ApiClient::new(executor, login, config.endpoint.clone());
    Ok(client.with_logger(Arc::clone(&config.logger)))
}

/// Configuration holder that builds its client on first use
#[derive(Debug, Default)]
pub struct AuthenticatedApi {
    config: ClientConfig,
    client: OnceCell<Arc<ApiClient>>,
}

impl AuthenticatedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self { config, client: OnceCell::new() }
    }

    /// Facade configured from `TICKETAUTH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_config(load_from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The client, built on first call.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Configuration`](ticketauth_common::ApiClientError::Configuration)
    /// before any network call if a required value is missing.
    pub fn client(&self) -> Result<Arc<ApiClient>> {
        self.client.get_or_try_init(|| build_client(&self.config).map(Arc::new)).cloned()
    }

    /// Base URL of the resource API.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.config.endpoint = endpoint.into();
        self.invalidate();
    }

    /// Set credentials; the login endpoint becomes `<auth_base>/v1/tickets`.
    pub fn set_credentials(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        auth_base: &str,
    ) {
        self.config.username = username.into();
        self.config.password = password.into();
        self.config.login_endpoint = login_endpoint_for(auth_base);
        self.invalidate();
    }

    /// Override the derived login endpoint with an absolute URL.
    pub fn set_login_endpoint(&mut self, login_endpoint: impl Into<String>) {
        self.config.login_endpoint = login_endpoint.into();
        self.invalidate();
    }

    pub fn set_logger(&mut self, logger: Arc<dyn RequestLogger>) {
        self.config.logger = logger;
        self.invalidate();
    }

    pub fn set_cache(&mut self, cache: Arc<dyn KeyValueCache>) {
        self.config.cache = cache;
        self.invalidate();
    }

    pub fn set_transport(&mut self, transport: Arc<dyn HttpTransport>) {
        self.config.transport = Some(transport);
        self.invalidate();
    }

    pub fn set_ticket_scheme(&mut self, scheme: impl Into<String>) {
        self.config.ticket_scheme = scheme.into();
        self.invalidate();
    }

    pub fn set_ticket_lifetime(&mut self, lifetime: Option<Duration>) {
        self.config.ticket_lifetime = lifetime;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        if self.client.take().is_some() {
            debug!("configuration changed, dropping built client");
        }
    }

    /// # Errors
    /// See [`ApiClient::get`]; also fails with a configuration error.
    pub async fn get(
        &self,
        path: &str,
        headers: HeaderMap,
        authenticate: bool,
    ) -> Result<HttpResponse> {
        self.client()?.get(path, headers, authenticate).await
    }

    /// # Errors
    /// See [`ApiClient::post`]; also fails with a configuration error.
    pub async fn post(
        &self,
        path: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
        authenticate: bool,
    ) -> Result<HttpResponse> {
        self.client()?.post(path, body, headers, authenticate).await
    }

    /// # Errors
    /// See [`ApiClient::put`]; also fails with a configuration error.
    pub async fn put(
        &self,
        path: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
        authenticate: bool,
    ) -> Result<HttpResponse> {
        self.client()?.put(path, body, headers, authenticate).await
    }

    /// # Errors
    /// See [`ApiClient::patch`]; also fails with a configuration error.
    pub async fn patch(
        &self,
        path: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
        authenticate: bool,
    ) -> Result<HttpResponse> {
        self.client()?.patch(path, body, headers, authenticate).await
    }

    /// # Errors
    /// See [`ApiClient::post_json`]; also fails with a configuration error.
    pub async fn post_json<T>(&self, path: &str, body: &T) -> Result<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        self.client()?.post_json(path, body).await
    }

    /// # Errors
    /// See [`ApiClient::put_json`]; also fails with a configuration error.
    pub async fn put_json<T>(&self, path: &str, body: &T) -> Result<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        self.client()?.put_json(path, body).await
    }

    /// # Errors
    /// See [`ApiClient::patch_json`]; also fails with a configuration error.
    pub async fn patch_json<T>(&self, path: &str, body: &T) -> Result<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        self.client()?.patch_json(path, body).await
    }

    /// # Errors
    /// See [`ApiClient::execute`]; also fails with a configuration error.
    pub async fn execute(&self, spec: RequestSpec) -> Result<HttpResponse> {
        self.client()?.execute(spec).await
    }
}
