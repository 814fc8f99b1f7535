//! Request specification type

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::{AUTHORIZATION, Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};

/// An outgoing API call as issued by application code.
///
/// `path` is either rooted at the client's base URL (`/api/users`) or an
/// absolute `http(s)` URL. The `retried` flag is one-shot: once a request
/// has been replayed after a token refresh it is never refreshed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Identifier used to correlate log lines for one call.
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Target path or absolute URL
    pub path: String,
    /// Query parameters in order
    #[serde(default)]
    pub query: Vec<(String, String)>,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// JSON body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Per-request timeout overriding the client default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    retried: bool,
}

impl ApiRequest {
    /// Creates a request with no headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
            timeout: None,
            retried: false,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Post, path).with_json(body)
    }

    /// Creates a PUT request with a JSON body.
    #[must_use]
    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Put, path).with_json(body)
    }

    /// Creates a PATCH request with a JSON body.
    #[must_use]
    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Patch, path).with_json(body)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the `Authorization` header with a bearer credential.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers.set(AUTHORIZATION, format!("Bearer {token}"));
    }

    /// Returns the bearer token currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Marks the request as replayed after a refresh.
    pub const fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Returns true once the request has been replayed.
    #[must_use]
    pub const fn is_retried(&self) -> bool {
        self.retried
    }

    /// Returns true if the request path refers to the given endpoint.
    #[must_use]
    pub fn targets(&self, endpoint: &str) -> bool {
        self.path.contains(endpoint)
    }

    /// Resolves the request against a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the path cannot be joined
    /// onto the base URL.
    pub fn prepare(&self, base_url: &Url, default_timeout: Duration) -> DomainResult<PreparedRequest> {
        let mut url = match Url::parse(&self.path) {
            Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => absolute,
            _ => base_url
                .join(&self.path)
                .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.path)))?,
        };

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        Ok(PreparedRequest {
            id: self.id,
            method: self.method,
            url,
            headers: self.headers.clone(),
            body: self.body.clone(),
            timeout: self.timeout.unwrap_or(default_timeout),
        })
    }
}

/// A request resolved to an absolute URL, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// Identifier of the originating [`ApiRequest`].
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL including query parameters
    pub url: Url,
    /// HTTP headers
    pub headers: Headers,
    /// JSON body
    pub body: Option<serde_json::Value>,
    /// Transport timeout
    pub timeout: Duration,
}
