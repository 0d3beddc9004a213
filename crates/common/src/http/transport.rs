//! Pluggable HTTP transport
//!
//! This trait allows dependency injection and testing with canned
//! responses. Implementations report failures with any error type; the
//! [`RequestExecutor`](super::RequestExecutor) normalizes them.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{HttpRequest, HttpResponse};
use crate::error::BoxError;

/// Sends a fully formed request and returns the response or a failure.
///
/// Non-2xx statuses are responses, not failures.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

#[async_trait]
impl<T> HttpTransport for Arc<T>
where
    T: HttpTransport + ?Sized,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        (**self).send(request).await
    }
}
