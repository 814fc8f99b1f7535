//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A response or request body could not be decoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// An access token is not a well-formed JWT.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The social login provider is not supported.
    #[error("unsupported login provider: {0}")]
    UnsupportedProvider(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
