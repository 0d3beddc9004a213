//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use parking_lot::Mutex;
use tracing::Level;

use crate::error::BoxError;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::observability::RequestLogger;

/// Canned result for a mocked call
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Response(HttpResponse),
    /// Transport-level failure with the given message
    Failure(String),
}

impl From<HttpResponse> for MockOutcome {
    fn from(response: HttpResponse) -> Self {
        Self::Response(response)
    }
}

// Type aliases to reduce complexity
type OutcomeMap = Arc<Mutex<HashMap<String, MockOutcome>>>;
type OutcomeSequenceMap = Arc<Mutex<HashMap<String, Vec<MockOutcome>>>>;
type RequestLog = Arc<Mutex<Vec<HttpRequest>>>;

/// Mock HTTP transport for testing
///
/// Responses are registered per absolute URL. A sequence is consumed one
/// entry per call; once it runs dry the single response for the URL (if
/// any) answers every further call. Unknown URLs fail like a refused
/// connection.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    outcomes: OutcomeMap,
    sequences: OutcomeSequenceMap,
    requests: RequestLog,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `url` with `outcome`.
    pub fn add_response(&self, url: &str, outcome: impl Into<MockOutcome>) {
        self.outcomes.lock().insert(normalize(url), outcome.into());
    }

    /// Answer successive calls to `url` with the given outcomes, in order.
    pub fn add_response_sequence<I, O>(&self, url: &str, outcomes: I)
    where
        I: IntoIterator<Item = O>,
        O: Into<MockOutcome>,
    {
        let sequence = outcomes.into_iter().map(Into::into).collect();
        self.sequences.lock().insert(normalize(url), sequence);
    }

    /// Fail every call to `url` with a transport error.
    pub fn add_failure(&self, url: &str, message: &str) {
        self.add_response(url, MockOutcome::Failure(message.to_string()));
    }

    /// Get all requests that were made
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Get the number of requests made to a URL
    #[must_use]
    pub fn request_count(&self, url: &str) -> usize {
        let url = normalize(url);
        self.requests.lock().iter().filter(|req| req.url.as_str() == url).count()
    }

    /// Verify that a request was made to the given URL
    #[must_use]
    pub fn was_called(&self, url: &str) -> bool {
        self.request_count(url) > 0
    }

    /// Get the last request made
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    /// Clear all recorded requests
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn next_outcome(&self, url: &str) -> Option<MockOutcome> {
        if let Some(sequence) = self.sequences.lock().get_mut(url) {
            if !sequence.is_empty() {
                return Some(sequence.remove(0));
            }
        }
        self.outcomes.lock().get(url).cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let url = request.url.as_str().to_string();
        self.requests.lock().push(request);

        match self.next_outcome(&url) {
            Some(MockOutcome::Response(response)) => Ok(response),
            Some(MockOutcome::Failure(message)) => {
                Err(Box::new(io::Error::new(io::ErrorKind::ConnectionRefused, message)))
            }
            None => Err(format!("No response configured for URL: {url}").into()),
        }
    }
}

/// Parse-and-print so `http://host` and `http://host/` name the same URL.
fn normalize(url: &str) -> String {
    url::Url::parse(url).map(String::from).unwrap_or_else(|_| url.to_string())
}

/// Response carrying a ticket in the `Boknett-TGT` header.
///
/// # Panics
/// Panics if `ticket` is not a valid header value.
#[must_use]
pub fn ticket_response(ticket: &str) -> HttpResponse {
    HttpResponse::new(StatusCode::CREATED).with_header(
        http::header::HeaderName::from_static("boknett-tgt"),
        http::header::HeaderValue::from_str(ticket).expect("ticket must be a valid header value"),
    )
}

/// Request logger that keeps every message in memory
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// use ticketauth_common::observability::RequestLogger;
/// use ticketauth_common::testing::MemoryLogger;
///
/// let logger = MemoryLogger::new();
/// logger.info("hello");
/// assert_eq!(logger.messages_at(tracing::Level::INFO), vec!["hello".to_string()]);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    entries: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().clone()
    }

    #[must_use]
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(entry_level, _)| *entry_level == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl RequestLogger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.entries.lock().push((Level::DEBUG, message.to_string()));
    }

    fn info(&self, message: &str) {
        self.entries.lock().push((Level::INFO, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;

    fn get(url: &str) -> HttpRequest {
        HttpRequest::new(Method::GET, url).unwrap()
    }

    #[tokio::test]
    async fn sequence_runs_before_fallback_response() {
        let transport = MockTransport::new();
        transport.add_response("http://host/a", HttpResponse::new(StatusCode::OK));
        transport.add_response_sequence(
            "http://host/a",
            [HttpResponse::new(StatusCode::UNAUTHORIZED)],
        );

        let first = transport.send(get("http://host/a")).await.unwrap();
        let second = transport.send(get("http://host/a")).await.unwrap();

        assert_eq!(first.status, StatusCode::UNAUTHORIZED);
        assert_eq!(second.status, StatusCode::OK);
        assert_eq!(transport.request_count("http://host/a"), 2);
    }

    #[tokio::test]
    async fn unknown_urls_and_failures_are_errors() {
        let transport = MockTransport::new();
        transport.add_failure("http://host", "connection refused");

        let err = transport.send(get("http://host/")).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");

        assert!(transport.send(get("http://other/")).await.is_err());
        assert!(transport.was_called("http://other"));
    }

    #[test]
    fn memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.debug("request");
        logger.info("response");

        assert_eq!(logger.entries().len(), 2);
        assert_eq!(logger.messages_at(Level::DEBUG), vec!["request".to_string()]);

        logger.clear();
        assert!(logger.entries().is_empty());
    }
}
