//! Error types for vane-core
//!
//! Two channels exist. [`Error`] is returned synchronously by administrative
//! calls (mounting, loading configuration). [`DispatchError`] is only ever
//! delivered through a dispatch continuation.

use crate::{Method, StatusCode};
use thiserror::Error;

/// Result type alias for vane operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error produced by a handler, passed through dispatch untouched
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Synchronous errors
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed mount specification or argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Outcome errors delivered to a dispatch continuation
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The path exists, but not under the requested method
    #[error("{method} is not allowed")]
    MethodNotAllowed { method: Method, allowed: Vec<Method> },

    /// Nothing matches the path under any method
    #[error("{path} does not exist")]
    ResourceNotFound { path: String },

    /// Error raised by a handler in the matched chain
    #[error("{0}")]
    Handler(#[source] HandlerError),
}

impl DispatchError {
    /// HTTP status a transport should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, DispatchError::MethodNotAllowed { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::ResourceNotFound { .. })
    }

    /// The handler's own error, if this came out of a chain
    pub fn handler_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            DispatchError::Handler(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
