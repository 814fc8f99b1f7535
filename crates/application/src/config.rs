//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Settings for an [`ApiClient`](crate::ApiClient).
///
/// Every field has a default, so partial configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin that relative request paths are joined onto.
    pub base_url: String,
    /// Token refresh endpoint.
    pub refresh_path: String,
    /// Endpoint returning the signed-in user.
    pub current_user_path: String,
    /// Route the user is sent to when the session ends.
    pub login_route: String,
    /// Minimum time between two refresh attempts.
    pub refresh_cooldown_ms: u64,
    /// How long a request waits on someone else's refresh.
    pub refresh_wait_timeout_ms: u64,
    /// Default transport timeout per request.
    pub request_timeout_ms: u64,
    /// `User-Agent` sent by the HTTP transport.
    pub user_agent: String,
    /// Production mode marks credential cookies `Secure`.
    pub production: bool,
    /// File-backed credential jar; credentials stay in memory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_path: "/api/auth/refresh".to_string(),
            current_user_path: "/api/auth/me".to_string(),
            login_route: "/login".to_string(),
            refresh_cooldown_ms: 5_000,
            refresh_wait_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            user_agent: format!("Cogni/{}", env!("CARGO_PKG_VERSION")),
            production: false,
            cookie_file: None,
        }
    }
}

/// A configuration value that cannot be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// The base URL does not parse or is not HTTP(S).
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// Configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A duration is zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Offending field.
        field: &'static str,
    },

    /// A path or route is not rooted.
    #[error("{field} must start with '/': {value:?}")]
    UnrootedPath {
        /// Offending field.
        field: &'static str,
        /// Configured value.
        value: String,
    },
}

impl ClientConfig {
    /// Parses the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError::InvalidBaseUrl`] for unparseable or
    /// non-HTTP URLs.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigValidationError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigValidationError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigValidationError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.parsed_base_url()?;

        for (field, value) in [
            ("refresh_cooldown_ms", self.refresh_cooldown_ms),
            ("refresh_wait_timeout_ms", self.refresh_wait_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::ZeroDuration { field });
            }
        }

        for (field, value) in [
            ("refresh_path", &self.refresh_path),
            ("current_user_path", &self.current_user_path),
            ("login_route", &self.login_route),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigValidationError::UnrootedPath {
                    field,
                    value: value.clone(),
                });
            }
        }

        Ok(())
    }

    /// Minimum time between refresh attempts.
    #[must_use]
    pub const fn refresh_cooldown(&self) -> Duration {
        Duration::from_millis(self.refresh_cooldown_ms)
    }

    /// Bound on waiting for an in-flight refresh.
    #[must_use]
    pub const fn refresh_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_wait_timeout_ms)
    }

    /// Default transport timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
