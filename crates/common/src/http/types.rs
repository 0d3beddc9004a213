//! HTTP request and response values exchanged with a transport
//!
//! Bodies are held as [`Bytes`]: cloning is cheap and reading a body never
//! consumes it, so a response can be logged and then handed to the caller
//! with its body intact.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{ApiClientError, Result};

/// A fully formed request handed to an [`HttpTransport`](super::HttpTransport).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,

    /// Absolute, already parsed URL
    pub url: url::Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a request without headers or body.
    ///
    /// # Errors
    /// Returns a transport error if `url` is not an absolute URL.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = url::Url::parse(url).map_err(|err| ApiClientError::Transport {
            message: format!("invalid request URL '{url}': {err}"),
            code: None,
            source: Some(Box::new(err)),
        })?;

        Ok(Self { method, url, headers: HeaderMap::new(), body: None })
    }

    /// Set a header, replacing any previous value for the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A response returned by a transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// Set a header, replacing any previous value for the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the response body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// HTTP status code of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// First value of a header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Raw body bytes; reading them leaves the body in place.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    /// Returns a serialization error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Group header values by lowercase name, preserving the order of values.
pub fn headers_to_map(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

#[cfg(test)]
mod tests {
    use http::header::{CONTENT_TYPE, SET_COOKIE};

    use super::*;

    #[test]
    fn request_rejects_relative_urls() {
        let err = HttpRequest::new(Method::GET, "???").unwrap_err();
        assert!(err.message().contains("invalid request URL"));
    }

    #[test]
    fn request_header_last_write_wins() {
        let request = HttpRequest::new(Method::GET, "http://host/items")
            .unwrap()
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn response_body_can_be_read_repeatedly() {
        let response = HttpResponse::new(StatusCode::OK).with_body(r#"{"body":"example"}"#);

        let first: serde_json::Value = response.json().unwrap();
        let second = response.text();

        assert_eq!(first["body"], "example");
        assert_eq!(second, r#"{"body":"example"}"#);
    }

    #[test]
    fn headers_to_map_groups_repeated_names() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let map = headers_to_map(&headers);
        assert_eq!(map["set-cookie"], vec!["a=1".to_string(), "b=2".to_string()]);
        assert_eq!(map["content-type"], vec!["text/plain".to_string()]);
    }
}
