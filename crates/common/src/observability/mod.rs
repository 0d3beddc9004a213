//! Request/response logging capability
//!
//! Logging is opt-in: the client records each request and response through
//! a [`RequestLogger`]. [`NoOpRequestLogger`] keeps the client silent;
//! [`TracingRequestLogger`] forwards messages to `tracing`.

use std::fmt::Debug;

/// `tracing` target used by [`TracingRequestLogger`]
pub const HTTP_LOG_TARGET: &str = "ticketauth::http";

/// Trait for structured request logging implementations
pub trait RequestLogger: Send + Sync + Debug {
    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    /// Check if logging is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

/// No-op logger for when request logging is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRequestLogger;

impl RequestLogger for NoOpRequestLogger {
    fn debug(&self, _message: &str) {
        // No-op
    }

    fn info(&self, _message: &str) {
        // No-op
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Logger that emits `tracing` events under [`HTTP_LOG_TARGET`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRequestLogger;

impl RequestLogger for TracingRequestLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: HTTP_LOG_TARGET, "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: HTTP_LOG_TARGET, "{message}");
    }
}
