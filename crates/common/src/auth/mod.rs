//! Ticket-based authentication
//!
//! A ticket (TGT) is obtained by posting credentials to the login endpoint
//! and is then sent on every request as `Authorization: <scheme> <ticket>`
//! together with a fresh `Date` header.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  LoginManager   │  Login protocol + reauthentication
//! └────────┬────────┘
//!          │
//!          ├──► RequestExecutor    (login call)
//!          └──► TicketStore        (current ticket)
//!                    │
//!                    └──► KeyValueCache  (optional write-through)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: [`Ticket`], [`Credentials`], [`ReauthState`]
//! - **[`ticket_store`]**: in-memory slot with cache write-through
//! - **[`login_manager`]**: login, reauthentication and auth headers

pub mod login_manager;
pub mod ticket_store;
pub mod types;

pub use login_manager::{LoginConfig, LoginManager};
pub use ticket_store::{ticket_cache_key, TicketStore, TICKET_CACHE_KEY_PREFIX};
pub use types::{
    http_date, Credentials, ReauthState, Ticket, DEFAULT_TICKET_HEADER,
    DEFAULT_TICKET_LIFETIME_SECS, DEFAULT_TICKET_SCHEME, HTTP_DATE_FORMAT,
};
