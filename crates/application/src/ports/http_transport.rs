//! HTTP transport port

use async_trait::async_trait;
use cogni_domain::{ApiResponse, PreparedRequest};
use thiserror::Error;

/// Failures below the HTTP layer: the server never produced a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request exceeded its timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for {host}: {message}")]
    Dns {
        /// Host that failed to resolve.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The server refused the TCP connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection failure, including TLS.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Anything else reported by the HTTP library.
    #[error("transport error: {0}")]
    Other(String),
}

/// Port for sending prepared requests.
///
/// Implementations return every HTTP response, including 4xx and 5xx, as
/// `Ok`; status handling belongs to the client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if no response was received.
    async fn send(&self, request: &PreparedRequest) -> Result<ApiResponse, TransportError>;
}
