//! Default HTTP transport

pub mod client;

pub use client::{ReqwestTransport, ReqwestTransportBuilder, DEFAULT_TIMEOUT};
