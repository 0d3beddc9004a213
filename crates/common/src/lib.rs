//! Shared building blocks for the ticket-authenticated HTTP client.
//!
//! # Safety and Quality
//!
//! This crate enforces strict safety and quality standards; the concrete
//! transport and the client facade live in `ticketauth-infra`.
//!
//! # Modules
//!
//! - [`error`]: the four-kind error taxonomy
//! - [`http`]: request/response values, the transport seam and the executor
//! - [`auth`]: tickets, the ticket store and the login manager
//! - [`cache`]: optional key/value cache for ticket persistence
//! - [`observability`]: optional request/response logging
//! - `testing` (feature `test-utils`): mock transport and logger

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod cache;
pub mod error;
pub mod http;
pub mod observability;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use crate::auth::{Credentials, LoginConfig, LoginManager, ReauthState, Ticket, TicketStore};
pub use crate::cache::{KeyValueCache, MemoryCache, NoOpCache};
pub use crate::error::{ApiClientError, BoxError, ErrorKind, Result};
pub use crate::http::{HttpRequest, HttpResponse, HttpTransport, RequestExecutor};
pub use crate::observability::{NoOpRequestLogger, RequestLogger, TracingRequestLogger};
