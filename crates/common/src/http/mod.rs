//! HTTP plumbing shared by the login manager and the request client
//!
//! - **[`types`]**: request/response values
//! - **[`transport`]**: the injectable [`HttpTransport`] seam
//! - **[`executor`]**: [`RequestExecutor`], which normalizes transport failures

pub mod executor;
pub mod transport;
pub mod types;

pub use executor::RequestExecutor;
pub use transport::HttpTransport;
pub use types::{headers_to_map, HttpRequest, HttpResponse};

// Re-export the `http` vocabulary so callers don't need a direct dependency
pub use http::header::{self, HeaderMap, HeaderName, HeaderValue};
pub use http::{Method, StatusCode};
