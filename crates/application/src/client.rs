//! The authenticated API client.
//!
//! Every call passes through the [`RequestDecorator`] on the way out and
//! the [`ResponseInterceptor`] on the way back. A first 401 asks the
//! [`RefreshCoordinator`] for a new token and replays the call once.

use std::sync::Arc;

use cogni_domain::{ApiRequest, ApiResponse};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::{
    Disposition, RefreshCoordinator, RequestDecorator, ResponseInterceptor, SessionCredentials,
    SessionService,
};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::ports::{Clock, CredentialStore, HttpTransport, Navigator};

/// HTTP client that keeps the session's credentials attached and fresh.
pub struct ApiClient {
    config: ClientConfig,
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
    navigator: Arc<dyn Navigator>,
    credentials: SessionCredentials,
    decorator: RequestDecorator,
    interceptor: ResponseInterceptor,
    coordinator: RefreshCoordinator,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Wires a client from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if `config` does not validate.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
    ) -> ApiResult<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;

        let credentials = SessionCredentials::new(store, Arc::clone(&clock), config.production);
        let coordinator = RefreshCoordinator::new(
            &config,
            base_url.clone(),
            Arc::clone(&transport),
            credentials.clone(),
            Arc::clone(&navigator),
            clock,
        );

        Ok(Self {
            decorator: RequestDecorator::new(credentials.clone()),
            interceptor: ResponseInterceptor::new(config.current_user_path.as_str()),
            config,
            base_url,
            transport,
            navigator,
            credentials,
            coordinator,
        })
    }

    /// Sends a request with full session handling.
    ///
    /// Non-2xx responses become [`ApiError::Status`]. A first 401 triggers
    /// one refresh and one replay; if no token can be obtained the call fails
    /// with [`ApiError::Unauthorized`] carrying the original response. A 422
    /// from the current-user endpoint also drops the stored access token.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures and rejected responses.
    pub async fn execute(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        self.decorator.decorate(&mut request);
        let response = self.send(&request).await?;

        if self.interceptor.inspect(&request, &response) != Disposition::Refresh {
            return self.settle(&request, response);
        }

        request.mark_retried();
        match self.coordinator.refresh().await {
            Ok(token) => {
                tracing::debug!(request_id = %request.id, "Replaying request with refreshed token");
                request.set_bearer(&token);
                let replayed = self.send(&request).await?;
                self.settle(&request, replayed)
            }
            Err(refresh) => {
                tracing::warn!(request_id = %request.id, error = %refresh, "Request stays unauthorized");
                Err(ApiError::Unauthorized {
                    response: Box::new(response),
                    refresh,
                })
            }
        }
    }

    /// Sends a decorated request without refresh handling.
    ///
    /// Used for the authentication endpoints themselves, where a 401 means
    /// bad credentials rather than a stale token.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures and non-2xx responses.
    pub async fn dispatch(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        self.decorator.decorate(&mut request);
        let response = self.send(&request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::status(response))
        }
    }

    /// `GET path` through [`execute`](Self::execute).
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn get(&self, path: &str) -> ApiResult<ApiResponse> {
        self.execute(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn post(&self, path: &str, body: serde_json::Value) -> ApiResult<ApiResponse> {
        self.execute(ApiRequest::post(path, body)).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn put(&self, path: &str, body: serde_json::Value) -> ApiResult<ApiResponse> {
        self.execute(ApiRequest::put(path, body)).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn patch(&self, path: &str, body: serde_json::Value) -> ApiResult<ApiResponse> {
        self.execute(ApiRequest::patch(path, body)).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn delete(&self, path: &str) -> ApiResult<ApiResponse> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// `GET path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute); also [`ApiError::Decode`] when the
    /// body does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.get(path).await?.json().map_err(ApiError::Decode)
    }

    /// Login, logout, registration and current-user operations.
    #[must_use]
    pub const fn session(&self) -> SessionService<'_> {
        SessionService::new(self)
    }

    /// Stored session credentials.
    #[must_use]
    pub const fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    /// The refresh coordinator shared by every call on this client.
    #[must_use]
    pub const fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL relative paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn navigate_to_login(&self) {
        self.navigate_to_route(&self.config.login_route);
    }

    pub(crate) fn navigate_to_route(&self, route: &str) {
        tracing::info!(route, "Navigating");
        self.navigator.navigate(route);
    }

    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let prepared = request
            .prepare(&self.base_url, self.config.request_timeout())
            .map_err(ApiError::InvalidRequest)?;

        tracing::debug!(
            request_id = %prepared.id,
            method = %prepared.method,
            url = %prepared.url,
            retried = request.is_retried(),
            "Sending request"
        );

        match self.transport.send(&prepared).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %prepared.id,
                    status = %response.status,
                    duration_ms = u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX),
                    "Received response"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(request_id = %prepared.id, url = %prepared.url, error = %e, "Request failed");
                Err(e.into())
            }
        }
    }

    fn settle(&self, request: &ApiRequest, response: ApiResponse) -> ApiResult<ApiResponse> {
        match self.interceptor.inspect(request, &response) {
            Disposition::Accept => Ok(response),
            Disposition::ClearAccessToken => {
                tracing::warn!(
                    path = %request.path,
                    "Current user endpoint returned 422, dropping access token"
                );
                self.credentials.clear_access_token();
                Err(ApiError::status(response))
            }
            Disposition::Refresh | Disposition::Reject => {
                tracing::debug!(request_id = %request.id, status = %response.status, "Request rejected");
                Err(ApiError::status(response))
            }
        }
    }
}
