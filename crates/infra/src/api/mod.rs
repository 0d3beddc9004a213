//! Authenticated API client
//!
//! # Architecture
//!
//! - [`ApiClient`] builds URLs, attaches ticket headers and retries once on 401
//! - [`AuthenticatedApi`] holds configuration and builds the client lazily
//! - [`RequestSpec`] describes a single request for [`ApiClient::execute`]
//!
//! Transport is pluggable through
//! [`HttpTransport`](ticketauth_common::http::HttpTransport); the default is
//! [`ReqwestTransport`](crate::http::ReqwestTransport).

pub mod client;
pub mod factory;
pub mod request;

pub use client::ApiClient;
pub use factory::{build_client, AuthenticatedApi};
pub use request::RequestSpec;
