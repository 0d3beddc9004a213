//! Request description consumed by [`ApiClient::execute`](super::ApiClient::execute)

use bytes::Bytes;
use ticketauth_common::http::{HeaderMap, HeaderName, HeaderValue, Method};

/// A request relative to the client's base endpoint
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,

    /// Appended verbatim to the base endpoint
    pub path: String,

    /// Caller headers; these win over computed auth headers
    pub headers: HeaderMap,

    pub body: Option<Bytes>,

    /// Attach `Authorization`/`Date` and retry once on 401
    pub authenticate: bool,
}

impl RequestSpec {
    /// Authenticated request without headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            authenticate: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Set a header, replacing earlier values for the same name.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set several headers; later entries replace earlier ones.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for name in headers.keys() {
            self.headers.remove(name);
        }
        for (name, value) in &headers {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn authenticate(mut self, authenticate: bool) -> Self {
        self.authenticate = authenticate;
        self
    }
}

#[cfg(test)]
mod tests {
    use ticketauth_common::http::header::{ACCEPT, CONTENT_TYPE};

    use super::*;

    #[test]
    fn defaults_to_authenticated_without_body() {
        let spec = RequestSpec::get("/items");
        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.path, "/items");
        assert!(spec.authenticate);
        assert!(spec.body.is_none());
        assert!(spec.headers.is_empty());
    }

    #[test]
    fn header_names_are_case_insensitive_and_last_write_wins() {
        let mut extra = HeaderMap::new();
        extra.insert(HeaderName::from_static("content-type"), HeaderValue::from_static("text/csv"));

        let spec = RequestSpec::post("/upload")
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .header(ACCEPT, HeaderValue::from_static("*/*"))
            .headers(extra)
            .body("a,b")
            .authenticate(false);

        assert_eq!(spec.headers.len(), 2);
        assert_eq!(spec.headers[CONTENT_TYPE], "text/csv");
        assert_eq!(spec.body.as_deref(), Some(&b"a,b"[..]));
        assert!(!spec.authenticate);
    }
}
