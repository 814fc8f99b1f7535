//! Response classification.

use cogni_domain::{ApiRequest, ApiResponse, StatusCode};

/// What the client does with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 2xx: hand the response to the caller.
    Accept,
    /// First 401 for this request: refresh and replay once.
    Refresh,
    /// 422 from the current-user endpoint: drop the access token, then reject.
    ClearAccessToken,
    /// Anything else: reject with the response unchanged.
    Reject,
}

/// Decides how each response is handled.
#[derive(Debug, Clone)]
pub struct ResponseInterceptor {
    current_user_path: String,
}

impl ResponseInterceptor {
    /// Creates an interceptor that treats `current_user_path` as the
    /// identity endpoint.
    #[must_use]
    pub fn new(current_user_path: impl Into<String>) -> Self {
        Self {
            current_user_path: current_user_path.into(),
        }
    }

    /// Classifies `response` to `request`.
    #[must_use]
    pub fn inspect(&self, request: &ApiRequest, response: &ApiResponse) -> Disposition {
        match response.status {
            status if status.is_success() => Disposition::Accept,
            StatusCode::UNAUTHORIZED if !request.is_retried() => Disposition::Refresh,
            StatusCode::UNPROCESSABLE_ENTITY if request.targets(&self.current_user_path) => {
                Disposition::ClearAccessToken
            }
            _ => Disposition::Reject,
        }
    }
}
