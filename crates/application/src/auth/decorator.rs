//! Outgoing request decoration.

use cogni_domain::ApiRequest;
use cogni_domain::request::{AUTHORIZATION, SESSION_ID};

use super::SessionCredentials;

/// Attaches the stored credentials to outgoing requests.
///
/// Headers the caller already set are left alone.
#[derive(Debug, Clone)]
pub struct RequestDecorator {
    credentials: SessionCredentials,
}

impl RequestDecorator {
    /// Creates a decorator reading from `credentials`.
    #[must_use]
    pub const fn new(credentials: SessionCredentials) -> Self {
        Self { credentials }
    }

    /// Adds `Authorization: Bearer <token>` and `X-Session-ID` when stored.
    pub fn decorate(&self, request: &mut ApiRequest) {
        if !request.headers.contains(AUTHORIZATION)
            && let Some(token) = self.credentials.access_token()
        {
            request.set_bearer(&token);
        }

        if !request.headers.contains(SESSION_ID)
            && let Some(session_id) = self.credentials.session_id()
        {
            request.headers.set(SESSION_ID, session_id);
        }
    }
}
