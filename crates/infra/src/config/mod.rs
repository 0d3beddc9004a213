//! Configuration loading and validation
//!
//! [`ClientConfig`] holds endpoints, credentials and the optional cache,
//! logger and transport capabilities. [`loader`] fills it from environment
//! variables.

pub mod loader;
pub mod settings;

// Re-export commonly used items
pub use loader::{load_from_env, load_from_lookup};
pub use settings::{login_endpoint_for, ClientConfig, LOGIN_PATH};
