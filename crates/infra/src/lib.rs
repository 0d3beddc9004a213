//! # Ticketauth Infrastructure
//!
//! I/O side of the ticket-authenticated client.
//!
//! This crate contains:
//! - The reqwest-backed HTTP transport
//! - The authenticated API client and its lazy facade
//! - Configuration loading from the environment
//!
//! ## Architecture
//! - Implements the transport trait defined in `ticketauth-common`
//! - Ticket lifecycle, caching and logging contracts live in `ticketauth-common`

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod http;

// Re-export commonly used items
pub use crate::api::{build_client, ApiClient, AuthenticatedApi, RequestSpec};
pub use crate::config::{load_from_env, ClientConfig};
pub use crate::http::{ReqwestTransport, ReqwestTransportBuilder};
