//! Error types for the catalog service
//!
//! Handlers never render these directly: a failure is turned into a
//! [`ProblemDetails`](crate::handlers::ProblemDetails) together with the
//! request's trace id, so the client only ever sees the status class and a
//! generic message.

use axum::http::StatusCode;
use thiserror::Error;

use crate::repository::{RepositoryError, RepositoryErrorKind};

/// Result type alias using the service error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Catalog store failure with operation context
    #[error("{0}")]
    Repository(RepositoryError),

    /// Redis error
    #[cfg(feature = "cache")]
    #[error("Redis error: {0}")]
    Redis(Box<redis::RedisError>),

    /// Cache backend failure that is not a Redis protocol error (pool exhaustion etc.)
    #[error("Cache error: {0}")]
    Cache(String),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(Box<jsonwebtoken::errors::Error>),

    /// Cache payload (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authorization error
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Feature intentionally not available (501)
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Upstream operation timed out (504)
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status the top-level handler maps this error to
    ///
    /// Unimplemented features map to 501, timeouts (including store timeouts)
    /// to 504, authentication failures to 401/403, and everything else to 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) | Error::Jwt(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Repository(e) if e.kind == RepositoryErrorKind::Timeout => {
                StatusCode::GATEWAY_TIMEOUT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to the caller
    ///
    /// Only authentication failures carry their own text; server-side
    /// failures collapse to a generic sentence.
    pub fn public_message(&self) -> String {
        match self {
            Error::Unauthorized(msg) | Error::Forbidden(msg) => msg.clone(),
            Error::Jwt(_) => "Invalid bearer token".to_string(),
            _ => match self.status_code() {
                StatusCode::NOT_IMPLEMENTED => {
                    "The requested functionality is not implemented.".to_string()
                }
                StatusCode::GATEWAY_TIMEOUT => {
                    "The server did not complete the request in time.".to_string()
                }
                _ => "An unexpected error occurred.".to_string(),
            },
        }
    }
}

// Manual From implementations for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        Error::Repository(err)
    }
}

#[cfg(feature = "cache")]
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Redis(Box::new(err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Jwt(Box::new(err))
    }
}
