//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock transport and in-memory request logger
//!
//! Enabled for the crate's own tests and, for downstream crates, through the
//! `test-utils` feature.

pub mod mocks;

pub use mocks::{ticket_response, MemoryLogger, MockOutcome, MockTransport};
