use std::sync::Arc;

use bytes::Bytes;
use http::header::HeaderMap;
use http::Method;
use tracing::debug;

use super::transport::HttpTransport;
use super::types::{HttpRequest, HttpResponse};
use crate::error::{ApiClientError, Result};

/// Executes requests through an injected transport.
///
/// Every failure, whether a malformed URL or an error raised by the
/// transport, comes back as [`ApiClientError::Transport`] carrying the
/// original error as its source. No retries happen here.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Build a request from its parts and send it.
    ///
    /// Headers are attached in iteration order; the body only when present.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Transport`] if the URL is invalid or the
    /// transport fails.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<Bytes>,
    ) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(method, url)?;

        for (name, value) in headers {
            request.headers.append(name.clone(), value.clone());
        }

        if let Some(body) = body {
            request.body = Some(body);
        }

        self.send(request).await
    }

    /// Send an already built request.
    ///
    /// # Errors
    /// Returns [`ApiClientError::Transport`] if the transport fails.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(%method, %url, "sending HTTP request");

        match self.transport.send(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(ApiClientError::transport(err))
            }
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor").finish_non_exhaustive()
    }
}
