//! Authenticated request client
//!
//! Composes the [`RequestExecutor`] with the [`LoginManager`]: every
//! authenticated call carries `Authorization` and `Date`, and a 401 answer
//! triggers one reauthentication followed by one retry.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};
use ticketauth_common::auth::{LoginManager, ReauthState};
use ticketauth_common::error::{ApiClientError, Result};
use ticketauth_common::http::header::CONTENT_TYPE;
use ticketauth_common::http::{
    headers_to_map, HeaderMap, HeaderValue, HttpResponse, Method, RequestExecutor, StatusCode,
};
use ticketauth_common::observability::{NoOpRequestLogger, RequestLogger};
use tracing::{info, instrument};

use super::request::RequestSpec;

const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP client that authenticates requests with a ticket
pub struct ApiClient {
    executor: RequestExecutor,
    login: Arc<LoginManager>,
    base_url: String,
    logger: Arc<dyn RequestLogger>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `executor` - Executes the primary requests
    /// * `login` - Supplies auth headers and reauthenticates on 401
    /// * `base_url` - Prepended verbatim to every request path
    pub fn new(
        executor: RequestExecutor,
        login: Arc<LoginManager>,
        base_url: impl Into<String>,
    ) -> Self {
        Self { executor, login, base_url: base_url.into(), logger: Arc::new(NoOpRequestLogger) }
    }

    /// Record request/response pairs through `logger`.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_manager(&self) -> &Arc<LoginManager> {
        &self.login
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Authentication`] if a required login fails
    /// and [`ApiClientError::Transport`] if the request cannot be executed.
    pub async fn get(
        &self,
        path: &str,
        headers: HeaderMap,
        authenticate: bool,
    ) -> Result<HttpResponse> {
        self.execute(RequestSpec::get(path).headers(headers).authenticate(authenticate)).await
    }

    /// Execute a POST request
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn post(
        &self,
        path: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
        authenticate: bool,
    ) -> Result<HttpResponse> {
        self.execute(with_body(RequestSpec::post(path), body, headers, authenticate)).await
    }

    /// Execute a PUT request
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn put(
        &self,
        path: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
        authenticate: bool,
    ) -> Result<HttpResponse> {
        self.execute(with_body(RequestSpec::put(path), body, headers, authenticate)).await
    }

    /// Execute a PATCH request
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn patch(
        &self,
        path: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
        authenticate: bool,
    ) -> Result<HttpResponse> {
        self.execute(with_body(RequestSpec::patch(path), body, headers, authenticate)).await
    }

    /// POST a JSON document with `Content-Type: application/json`.
    ///
    /// The value must serialize to a JSON object or array. The request is
    /// always authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Serialization`] before any network call if
    /// `body` is not an object or array or cannot be encoded.
    pub async fn post_json<T>(&self, path: &str, body: &T) -> Result<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        self.send_json(Method::POST, path, body).await
    }

    /// PUT a JSON document; see [`ApiClient::post_json`].
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::post_json`].
    pub async fn put_json<T>(&self, path: &str, body: &T) -> Result<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, path, body).await
    }

    /// PATCH a JSON document; see [`ApiClient::post_json`].
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::post_json`].
    pub async fn patch_json<T>(&self, path: &str, body: &T) -> Result<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    async fn send_json<T>(&self, method: Method, path: &str, body: &T) -> Result<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        let body = encode_json(body)?;
        let spec = RequestSpec::new(method, path)
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
            .body(body);
        self.execute(spec).await
    }

    /// Run a request through the full pipeline.
    ///
    /// A 401 answer to an authenticated request triggers one
    /// reauthentication and one retry with fresh headers. A second 401 is
    /// returned as a normal response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Authentication`] if login or
    /// reauthentication fails and [`ApiClientError::Transport`] if a request
    /// cannot be executed.
    #[instrument(skip(self, spec), fields(method = %spec.method, path = %spec.path))]
    pub async fn execute(&self, spec: RequestSpec) -> Result<HttpResponse> {
        let RequestSpec { method, path, headers, body, authenticate } = spec;
        let url = format!("{}{}", self.base_url, path);
        let mut state = ReauthState::new();

        loop {
            let (ticket, request_headers) = if authenticate {
                let ticket = self.login.ensure_ticket().await?;
                let auth = LoginManager::headers_for_ticket(&ticket)?;
                (Some(ticket), merge_headers(auth, &headers))
            } else {
                (None, headers.clone())
            };

            let response = self.dispatch(&method, &url, &request_headers, body.clone()).await?;

            if let Some(rejected) = ticket {
                if response.status() == StatusCode::UNAUTHORIZED && !state.is_re_auth_attempted() {
                    info!(%method, %url, "request rejected with 401, reauthenticating");
                    self.login.re_authenticate(&mut state, &rejected).await?;
                    continue;
                }
            }

            return Ok(response);
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<Bytes>,
    ) -> Result<HttpResponse> {
        if self.logger.is_enabled() {
            self.logger.debug(&request_log_line(method, url, body.as_ref()));
        }

        let response = self.executor.execute(method.clone(), url, headers, body).await?;

        if self.logger.is_enabled() {
            self.logger.info(&response_log_line(&response));
        }

        Ok(response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

fn with_body(
    spec: RequestSpec,
    body: Option<Bytes>,
    headers: HeaderMap,
    authenticate: bool,
) -> RequestSpec {
    let spec = spec.headers(headers).authenticate(authenticate);
    match body {
        Some(body) => spec.body(body),
        None => spec,
    }
}

/// Auth headers overlaid with caller headers; the caller wins per name.
fn merge_headers(mut auth: HeaderMap, caller: &HeaderMap) -> HeaderMap {
    for name in caller.keys() {
        auth.remove(name);
    }
    for (name, value) in caller {
        auth.append(name.clone(), value.clone());
    }
    auth
}

fn encode_json<T>(body: &T) -> Result<Bytes>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(body)?;
    if !(value.is_object() || value.is_array()) {
        return Err(ApiClientError::serialization("JSON body must be an object or array"));
    }
    Ok(Bytes::from(serde_json::to_vec(&value)?))
}

fn body_text(body: &Bytes) -> Value {
    Value::String(String::from_utf8_lossy(body).into_owned())
}

fn request_log_line(method: &Method, url: &str, body: Option<&Bytes>) -> String {
    json!({
        "method": method.as_str(),
        "url": url,
        "body": body.map_or(Value::Null, body_text),
    })
    .to_string()
}

fn response_log_line(response: &HttpResponse) -> String {
    json!({
        "code": response.status().as_u16(),
        "headers": headers_to_map(&response.headers),
        "body": body_text(response.bytes()),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ticketauth_common::auth::{Credentials, LoginConfig, TicketStore};
    use ticketauth_common::error::ErrorKind;
    use ticketauth_common::http::header::{ACCEPT, AUTHORIZATION, DATE};
    use ticketauth_common::testing::{ticket_response, MemoryLogger, MockTransport};
    use tracing::Level;

    use super::*;

    const LOGIN_URL: &str = "http://auth.test/v1/tickets";
    const BASE_URL: &str = "http://client.test";

    fn client(transport: &MockTransport) -> ApiClient {
        let executor = RequestExecutor::new(Arc::new(transport.clone()));
        let config = LoginConfig::new(LOGIN_URL, Credentials::new("user", "secret"));
        let login = Arc::new(LoginManager::new(executor.clone(), config, TicketStore::in_memory()));
        ApiClient::new(executor, login, BASE_URL)
    }

    #[tokio::test]
    async fn test_first_call_logs_in_then_sends_auth_headers() {
        let transport = MockTransport::new();
        transport.add_response(LOGIN_URL, ticket_response("TGT-1"));
        transport.add_response("http://client.test/items", HttpResponse::new(StatusCode::OK));
        let client = client(&transport);

        let response = client.get("/items", HeaderMap::new(), true).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url.as_str(), LOGIN_URL);
        assert_eq!(requests[1].method, Method::GET);
        assert_eq!(requests[1].url.as_str(), "http://client.test/items");
        assert_eq!(requests[1].headers[AUTHORIZATION], "Boknett TGT-1");
        assert!(requests[1].headers.contains_key(DATE));
    }

    #[tokio::test]
    async fn test_second_call_reuses_ticket() {
        let transport = MockTransport::new();
        transport.add_response(LOGIN_URL, ticket_response("TGT-1"));
        transport.add_response("http://client.test/items", HttpResponse::new(StatusCode::OK));
        let client = client(&transport);

        client.get("/items", HeaderMap::new(), true).await.unwrap();
        client.get("/items", HeaderMap::new(), true).await.unwrap();

        assert_eq!(transport.request_count(LOGIN_URL), 1);
        assert_eq!(transport.request_count("http://client.test/items"), 2);
    }

    #[tokio::test]
    async fn test_unauthenticated_call_skips_login() {
        let transport = MockTransport::new();
        transport.add_response("http://client.test/public", HttpResponse::new(StatusCode::OK));
        let client = client(&transport);

        client.get("/public", HeaderMap::new(), false).await.unwrap();

        assert!(!transport.was_called(LOGIN_URL));
        assert!(!transport.last_request().unwrap().headers.contains_key(AUTHORIZATION));
    }

    #[tokio::test]
    async fn test_401_reauthenticates_and_retries_once() {
        let transport = MockTransport::new();
        transport.add_response_sequence(
            LOGIN_URL,
            [ticket_response("TGT-1"), ticket_response("TGT-2")],
        );
        transport.add_response_sequence(
            "http://client.test/items",
            [HttpResponse::new(StatusCode::UNAUTHORIZED), HttpResponse::new(StatusCode::OK)],
        );
        let client = client(&transport);

        let response = client.get("/items", HeaderMap::new(), true).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.request_count(LOGIN_URL), 2);
        let requests = transport.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[1].headers[AUTHORIZATION], "Boknett TGT-1");
        assert_eq!(requests[3].headers[AUTHORIZATION], "Boknett TGT-2");
    }

    #[tokio::test]
    async fn test_second_401_is_returned_without_another_login() {
        let transport = MockTransport::new();
        transport.add_response_sequence(
            LOGIN_URL,
            [ticket_response("TGT-1"), ticket_response("TGT-2"), ticket_response("TGT-3")],
        );
        transport
            .add_response("http://client.test/items", HttpResponse::new(StatusCode::UNAUTHORIZED));
        let client = client(&transport);

        let response = client.get("/items", HeaderMap::new(), true).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(transport.request_count(LOGIN_URL), 2);
        assert_eq!(transport.request_count("http://client.test/items"), 2);

        // The next call starts a fresh cycle and may reauthenticate again
        client.get("/items", HeaderMap::new(), true).await.unwrap();
        assert_eq!(transport.request_count(LOGIN_URL), 3);
    }

    #[tokio::test]
    async fn test_401_without_authentication_is_returned_as_is() {
        let transport = MockTransport::new();
        transport
            .add_response("http://client.test/items", HttpResponse::new(StatusCode::UNAUTHORIZED));
        let client = client(&transport);

        let response = client.get("/items", HeaderMap::new(), false).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_caller_headers_win_over_auth_headers() {
        let transport = MockTransport::new();
        transport.add_response(LOGIN_URL, ticket_response("TGT-1"));
        transport.add_response("http://client.test/items", HttpResponse::new(StatusCode::OK));
        let client = client(&transport);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Custom abc"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        client.get("/items", headers, true).await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.headers[AUTHORIZATION], "Custom abc");
        assert_eq!(request.headers[ACCEPT], "application/json");
        assert!(request.headers.contains_key(DATE));
    }

    #[tokio::test]
    async fn test_path_is_concatenated_verbatim() {
        let transport = MockTransport::new();
        transport.add_response("http://client.testitems?x=1", HttpResponse::new(StatusCode::OK));
        let client = client(&transport);

        // No slash is inserted between base and path
        let result = client.get("items?x=1", HeaderMap::new(), false).await;

        assert!(result.is_ok());
        assert_eq!(transport.last_request().unwrap().url.as_str(), "http://client.testitems/?x=1");
    }

    #[tokio::test]
    async fn test_transport_failure_is_wrapped() {
        let transport = MockTransport::new();
        transport.add_response(LOGIN_URL, ticket_response("TGT-1"));
        transport.add_failure("http://client.test/x", "network unreachable");
        let client = client(&transport);

        let err = client.get("/x", HeaderMap::new(), true).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.message(), "network unreachable");
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_as_authentication_error() {
        let transport = MockTransport::new();
        transport.add_response(LOGIN_URL, HttpResponse::new(StatusCode::FORBIDDEN));
        let client = client(&transport);

        let err = client.get("/items", HeaderMap::new(), true).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.code(), Some(403));
        assert!(!transport.was_called("http://client.test/items"));
    }

    #[tokio::test]
    async fn test_post_json_round_trips_body() {
        let transport = MockTransport::new();
        transport.add_response(LOGIN_URL, ticket_response("TGT-1"));
        transport
            .add_response("http://client.test/orders", HttpResponse::new(StatusCode::CREATED));
        let client = client(&transport);

        let mut order = BTreeMap::new();
        order.insert("isbn", json!("9788202000000"));
        order.insert("quantity", json!(2));
        let response = client.post_json("/orders", &order).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert!(request.headers.contains_key(AUTHORIZATION));
        let decoded: BTreeMap<String, Value> =
            serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(decoded["isbn"], "9788202000000");
        assert_eq!(decoded["quantity"], 2);
    }

    #[tokio::test]
    async fn test_post_json_rejects_scalars_before_any_io() {
        let transport = MockTransport::new();
        let client = client(&transport);

        let err = client.post_json("/x", "not-a-mapping").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_put_and_patch_json_use_their_methods() {
        let transport = MockTransport::new();
        transport.add_response(LOGIN_URL, ticket_response("TGT-1"));
        transport.add_response("http://client.test/orders/1", HttpResponse::new(StatusCode::OK));
        let client = client(&transport);

        client.put_json("/orders/1", &json!({"quantity": 1})).await.unwrap();
        assert_eq!(transport.last_request().unwrap().method, Method::PUT);

        client.patch_json("/orders/1", &json!([{"op": "remove"}])).await.unwrap();
        assert_eq!(transport.last_request().unwrap().method, Method::PATCH);
    }

    #[tokio::test]
    async fn test_execute_supports_other_methods() {
        let transport = MockTransport::new();
        transport.add_response(LOGIN_URL, ticket_response("TGT-1"));
        transport
            .add_response("http://client.test/orders/1", HttpResponse::new(StatusCode::NO_CONTENT));
        let client = client(&transport);

        let response = client.execute(RequestSpec::delete("/orders/1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(transport.last_request().unwrap().method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_request_and_response_are_logged_without_consuming_body() {
        let transport = MockTransport::new();
        transport.add_response(
            "http://client.test/path",
            HttpResponse::new(StatusCode::OK).with_body(r#"{"body":"example"}"#),
        );
        let logger = MemoryLogger::new();
        let client = client(&transport).with_logger(Arc::new(logger.clone()));

        let response = client
            .post("/path", Some(Bytes::from(r#"{"data":"data"}"#)), HeaderMap::new(), false)
            .await
            .unwrap();

        let debug = logger.messages_at(Level::DEBUG);
        let info = logger.messages_at(Level::INFO);
        assert_eq!(debug.len(), 1);
        assert_eq!(info.len(), 1);

        let request: Value = serde_json::from_str(&debug[0]).unwrap();
        assert_eq!(
            request,
            json!({
                "method": "POST",
                "url": "http://client.test/path",
                "body": r#"{"data":"data"}"#,
            })
        );
        let logged: Value = serde_json::from_str(&info[0]).unwrap();
        assert_eq!(logged, json!({"code": 200, "headers": {}, "body": r#"{"body":"example"}"#}));

        assert_eq!(response.text(), r#"{"body":"example"}"#);
    }

    #[tokio::test]
    async fn test_request_log_renders_missing_body_as_null() {
        let transport = MockTransport::new();
        transport.add_response("http://client.test/path", HttpResponse::new(StatusCode::OK));
        let logger = MemoryLogger::new();
        let client = client(&transport).with_logger(Arc::new(logger.clone()));

        client.get("/path", HeaderMap::new(), false).await.unwrap();

        let debug = logger.messages_at(Level::DEBUG);
        let logged: Value = serde_json::from_str(&debug[0]).unwrap();
        assert_eq!(logged["method"], "GET");
        assert!(logged["body"].is_null());
    }
}
