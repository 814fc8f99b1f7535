//! Application error types

use cogni_domain::{ApiResponse, DomainError, StatusCode, ValidationErrors};
use thiserror::Error;

use crate::config::ConfigValidationError;
use crate::ports::{StoreError, TransportError};

/// Why a token refresh produced no token.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The previous attempt started less than one cooldown window ago.
    #[error("refresh refused: last attempt {elapsed_ms}ms ago, cooldown is {cooldown_ms}ms")]
    CoolingDown {
        /// Time since the previous attempt.
        elapsed_ms: u64,
        /// Configured cooldown.
        cooldown_ms: u64,
    },

    /// No refresh token is stored. Ends the session.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint rejected the refresh token (401/403). Ends the session.
    #[error("refresh token rejected with status {status}")]
    Rejected {
        /// Status returned by the refresh endpoint.
        status: StatusCode,
    },

    /// The refresh endpoint failed with another status.
    #[error("refresh endpoint returned status {status}")]
    Failed {
        /// Status returned by the refresh endpoint.
        status: StatusCode,
    },

    /// The refresh endpoint answered 2xx without a usable access token.
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The refresh request could not be built.
    #[error("refresh request could not be built: {0}")]
    InvalidRequest(DomainError),

    /// The refresh call never got a response.
    #[error("refresh request failed: {0}")]
    Transport(#[from] TransportError),

    /// This caller gave up waiting on another caller's refresh.
    #[error("timed out after {waited_ms}ms waiting for the in-flight refresh")]
    WaitTimedOut {
        /// How long the caller waited.
        waited_ms: u64,
    },

    /// The refresh this caller was waiting on produced no token.
    #[error("the in-flight refresh did not produce a token")]
    InFlightFailed,
}

impl RefreshError {
    /// Returns true if this failure cleared the stored credentials.
    #[must_use]
    pub const fn ended_session(&self) -> bool {
        matches!(self, Self::MissingRefreshToken | Self::Rejected { .. })
    }
}

/// Errors surfaced to callers of the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("request failed with status {}", .0.status)]
    Status(Box<ApiResponse>),

    /// The server answered 401 and the token could not be refreshed.
    #[error("request unauthorized and token refresh failed: {refresh}")]
    Unauthorized {
        /// The original 401 response.
        response: Box<ApiResponse>,
        /// Why no new token was obtained.
        refresh: RefreshError,
    },

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(DomainError),

    /// A 2xx body did not have the expected shape.
    #[error("invalid response body: {0}")]
    Decode(DomainError),

    /// Login succeeded at the HTTP level but returned no access token.
    #[error("login failed: no access token received")]
    MissingAccessToken,

    /// The sign-up form failed client-side validation.
    #[error("registration form is invalid: {0}")]
    Validation(ValidationErrors),

    /// The OAuth callback URL carried no `token` parameter.
    #[error("authentication failed: callback has no token")]
    MissingCallbackToken,

    /// The identity provider reported an error on the OAuth callback.
    #[error("authentication failed: {0}")]
    CallbackRejected(String),

    /// Credentials could not be written.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// The client configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigValidationError),
}

impl ApiError {
    /// Wraps a non-2xx response.
    #[must_use]
    pub fn status(response: ApiResponse) -> Self {
        Self::Status(Box::new(response))
    }

    /// The response behind this error, for diagnostics.
    #[must_use]
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Status(response) | Self::Unauthorized { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The HTTP status behind this error, if the server answered.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.response().map(|r| r.status)
    }
}

/// Result type alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;
