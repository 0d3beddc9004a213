//! Error taxonomy shared by every ticketauth component
//!
//! Callers see exactly four kinds of failure:
//!
//! | Kind | Raised when |
//! |------|-------------|
//! | [`ErrorKind::Configuration`] | A required setup value is missing; raised before any I/O |
//! | [`ErrorKind::Authentication`] | The login or reauthentication call failed |
//! | [`ErrorKind::Transport`] | The primary request could not be executed |
//! | [`ErrorKind::Serialization`] | A JSON convenience method could not encode its input |
//!
//! Transport-specific error types never leak through: the transport adapter
//! wraps them into [`ApiClientError::Transport`] and keeps the original as the
//! error `source()`.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error produced by pluggable collaborators (transports, caches).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias used throughout the client.
pub type Result<T> = std::result::Result<T, ApiClientError>;

/// Code attached to configuration errors.
pub const CONFIGURATION_ERROR_CODE: i64 = 503;

/// Category of an [`ApiClientError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required configuration missing
    Configuration,
    /// Login or reauthentication failed
    Authentication,
    /// Request execution failed
    Transport,
    /// Request body encoding failed
    Serialization,
}

/// Errors surfaced by the authenticated client
#[derive(Debug, Error)]
pub enum ApiClientError {
    /// A required configuration value is empty; raised before any I/O
    #[error("Parameter \"{field}\" has no value.")]
    Configuration { field: String },

    /// Login or reauthentication failed
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        code: Option<i64>,
        #[source]
        source: Option<BoxError>,
    },

    /// Executing a request failed before a response arrived
    #[error("{message}")]
    Transport {
        message: String,
        code: Option<i64>,
        #[source]
        source: Option<BoxError>,
    },

    /// A JSON body could not be encoded or has the wrong shape
    #[error("Serialization failed: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl ApiClientError {
    /// Missing configuration value, named by its configuration key.
    pub fn configuration(field: impl Into<String>) -> Self {
        Self::Configuration { field: field.into() }
    }

    /// Authentication failure without an HTTP status.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into(), code: None, source: None }
    }

    /// Authentication failure caused by a non-2xx login response.
    pub fn authentication_status(status: u16, message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: Some(i64::from(status)),
            source: None,
        }
    }

    /// Wrap an arbitrary failure raised while executing a request.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        let source: BoxError = err.into();
        Self::Transport { message: source.to_string(), code: None, source: Some(source) }
    }

    /// Transport failure described only by a message.
    pub fn transport_message(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into(), code: None, source: None }
    }

    /// JSON encoding or shape failure in the request helpers.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Attach a numeric code to an authentication or transport error.
    ///
    /// Other kinds are returned unchanged.
    #[must_use]
    pub fn with_code(mut self, new_code: i64) -> Self {
        match &mut self {
            Self::Authentication { code, .. } | Self::Transport { code, .. } => {
                *code = Some(new_code);
            }
            Self::Configuration { .. } | Self::Serialization { .. } => {}
        }
        self
    }

    /// Get the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Serialization { .. } => ErrorKind::Serialization,
        }
    }

    /// Numeric code carried by the error, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Configuration { .. } => Some(CONFIGURATION_ERROR_CODE),
            Self::Authentication { code, .. } | Self::Transport { code, .. } => *code,
            Self::Serialization { .. } => None,
        }
    }

    /// Human-readable message without the category prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Configuration { .. } => self.to_string(),
            Self::Authentication { message, .. }
            | Self::Transport { message, .. }
            | Self::Serialization { message, .. } => message.clone(),
        }
    }

    /// Missing field name for configuration errors.
    pub fn missing_field(&self) -> Option<&str> {
        match self {
            Self::Configuration { field } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization { message: err.to_string(), source: Some(Box::new(err)) }
    }
}
