//! Sign-in lifecycle on top of [`ApiClient`].
//!
//! The authentication endpoints go through [`ApiClient::dispatch`]: a 401
//! from `login` means wrong credentials, not a stale token. Only the
//! current-user lookup uses the refreshing path.

use cogni_domain::{
    ApiRequest, ApiResponse, CredentialKey, ForgotPasswordRequest, LoginRequest, MessageResponse,
    PasswordReset, RegistrationForm, ResendVerificationRequest, SessionStatus, SocialProvider,
    TokenGrant, User, token_preview,
};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};

/// Login endpoint.
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Logout endpoint.
pub const LOGOUT_PATH: &str = "/api/auth/logout";
/// Sign-up endpoint.
pub const REGISTER_PATH: &str = "/api/auth/register";
/// Password reset email endpoint.
pub const FORGOT_PASSWORD_PATH: &str = "/api/auth/forgot-password";
/// Prefix of the password reset endpoint; the reset token follows.
pub const RESET_PASSWORD_PATH: &str = "/api/auth/reset-password";
/// Prefix of the email verification endpoint; the verification token follows.
pub const VERIFY_EMAIL_PATH: &str = "/api/auth/verify-email";
/// Verification email endpoint.
pub const RESEND_VERIFICATION_PATH: &str = "/api/auth/resend-verification";
/// Prefix of the social login entry points.
pub const OAUTH_PATH: &str = "/api/auth/oauth";

/// `GET /me` answers either with the user or with `{ "user": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl From<MeResponse> for User {
    fn from(value: MeResponse) -> Self {
        match value {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        }
    }
}

/// Session operations bound to one client.
#[derive(Debug, Clone, Copy)]
pub struct SessionService<'a> {
    client: &'a ApiClient,
}

impl<'a> SessionService<'a> {
    pub(crate) const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Signs in with email and password and stores the returned credentials.
    ///
    /// Returns the user embedded in the login response, or fetches it from
    /// the current-user endpoint when the response has none.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-2xx responses and responses without an
    /// access token. Any access token is removed on failure.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        tracing::info!(email, "Attempting login");
        let result = self.try_login(email, password).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Login failed");
            self.client.credentials().clear_access_token();
        }
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> ApiResult<User> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .dispatch(ApiRequest::post(LOGIN_PATH, to_json(&body)))
            .await?;
        let grant: TokenGrant = response.json().map_err(ApiError::Decode)?;

        let Some(access_token) = grant.access_token.as_deref().filter(|t| !t.is_empty()) else {
            return Err(ApiError::MissingAccessToken);
        };
        self.client.credentials().store_grant(&grant)?;
        tracing::info!(
            access_token = %token_preview(access_token),
            has_refresh_token = grant.refresh_token.is_some(),
            has_session_id = grant.session_id.is_some(),
            "Login successful, tokens stored"
        );

        match grant.user {
            Some(user) => Ok(user),
            None => self.current_user().await,
        }
    }

    /// Ends the session.
    ///
    /// The server is told first; whatever it answers, local credentials are
    /// cleared and the navigator is sent to the login route.
    pub async fn logout(&self) {
        tracing::info!("Logging out");
        let request = ApiRequest::post(LOGOUT_PATH, json!({})).with_header(
            cogni_domain::request::SESSION_ID,
            self.client.credentials().session_id().unwrap_or_default(),
        );
        if let Err(e) = self.client.dispatch(request).await {
            tracing::warn!(error = %e, "Logout endpoint failed, continuing with local logout");
        }

        self.client.credentials().clear_all();
        self.client.navigate_to_login();
    }

    /// Creates an account. The user must verify their email before logging in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without sending anything when the form
    /// is invalid; otherwise the server's error.
    pub async fn register(&self, form: &RegistrationForm) -> ApiResult<()> {
        form.validate().map_err(ApiError::Validation)?;
        self.client
            .dispatch(ApiRequest::post(REGISTER_PATH, to_json(form)))
            .await?;
        tracing::info!(email = %form.email, "Registration submitted");
        Ok(())
    }

    /// Requests a password reset email and returns the server's message.
    ///
    /// # Errors
    ///
    /// Returns the transport or status error.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<String> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        let response = self
            .client
            .dispatch(ApiRequest::post(FORGOT_PASSWORD_PATH, to_json(&body)))
            .await?;
        server_message(&response)
    }

    /// Sets a new password using the token from a reset email.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without sending anything when the two
    /// entries differ; otherwise the server's error.
    pub async fn reset_password(&self, token: &str, reset: &PasswordReset) -> ApiResult<String> {
        reset.validate().map_err(ApiError::Validation)?;
        let response = self
            .client
            .dispatch(ApiRequest::post(
                format!("{RESET_PASSWORD_PATH}/{token}"),
                to_json(reset),
            ))
            .await?;
        tracing::info!("Password reset accepted");
        server_message(&response)
    }

    /// Confirms an email address with the token from the verification email.
    ///
    /// # Errors
    ///
    /// Returns the transport or status error.
    pub async fn verify_email(&self, token: &str) -> ApiResult<String> {
        let response = self
            .client
            .dispatch(ApiRequest::get(format!("{VERIFY_EMAIL_PATH}/{token}")))
            .await?;
        server_message(&response)
    }

    /// Asks for another verification email.
    ///
    /// # Errors
    ///
    /// Returns the transport or status error.
    pub async fn resend_verification(&self, email: &str) -> ApiResult<String> {
        let body = ResendVerificationRequest {
            email: email.to_string(),
        };
        let response = self
            .client
            .dispatch(ApiRequest::post(RESEND_VERIFICATION_PATH, to_json(&body)))
            .await?;
        server_message(&response)
    }

    /// Fetches the signed-in user.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`]. A 422 also drops the access token.
    pub async fn current_user(&self) -> ApiResult<User> {
        let path = self.client.config().current_user_path.clone();
        let me: MeResponse = self.client.get_json(&path).await?;
        Ok(me.into())
    }

    /// Recovers the user from stored credentials at startup.
    ///
    /// Tries the access token first, then one refresh. Returns `None` when
    /// neither works.
    pub async fn restore(&self) -> Option<User> {
        let credentials = self.client.credentials();

        if credentials.access_token().is_some() {
            match self.current_user().await {
                Ok(user) => return Some(user),
                Err(e) => tracing::debug!(error = %e, "Stored access token not accepted"),
            }
        }

        if credentials.refresh_token().is_some() && credentials.access_token().is_none() {
            match self.client.coordinator().refresh().await {
                Ok(_) => return self.current_user().await.ok(),
                Err(e) => tracing::debug!(error = %e, "Could not refresh stored session"),
            }
        }

        tracing::info!("No usable stored session");
        None
    }

    /// Entry URL of the backend's social login flow.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the URL cannot be built.
    pub fn social_login_url(&self, provider: SocialProvider) -> ApiResult<Url> {
        self.client
            .base_url()
            .join(&format!("{OAUTH_PATH}/{}", provider.slug()))
            .map_err(|e| ApiError::InvalidRequest(cogni_domain::DomainError::InvalidUrl(e.to_string())))
    }

    /// Completes a social login from the URL the provider redirected to.
    ///
    /// Stores `token`, `refresh_token` and `session_id` from the query string
    /// and fetches the user. On any failure the navigator is sent to the
    /// login route with `?error=oauth_failed`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::CallbackRejected`] when the provider reported an
    /// error, [`ApiError::MissingCallbackToken`] when no token is present, or
    /// the current-user lookup's error.
    pub async fn complete_oauth_callback(&self, callback: &Url) -> ApiResult<User> {
        let result = self.try_oauth_callback(callback).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "OAuth callback processing failed");
            let route = format!("{}?error=oauth_failed", self.client.config().login_route);
            self.client.navigate_to_route(&route);
        }
        result
    }

    async fn try_oauth_callback(&self, callback: &Url) -> ApiResult<User> {
        let param = |name: &str| {
            callback
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(error) = param("error") {
            return Err(ApiError::CallbackRejected(error));
        }
        let token = param("token").ok_or(ApiError::MissingCallbackToken)?;

        let credentials = self.client.credentials();
        credentials.put(CredentialKey::AccessToken, &token)?;
        if let Some(refresh) = param("refresh_token") {
            credentials.put(CredentialKey::RefreshToken, &refresh)?;
        }
        if let Some(session_id) = param("session_id") {
            credentials.put(CredentialKey::SessionId, &session_id)?;
        }

        self.current_user().await
    }

    /// Summary of the stored credentials.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.client.credentials().status()
    }
}

fn server_message(response: &ApiResponse) -> ApiResult<String> {
    let message: MessageResponse = response.json().map_err(ApiError::Decode)?;
    Ok(message.message)
}

fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, Reply};
    use cogni_domain::{ApiResponse, PreparedRequest, RegistrationField, StatusCode};
    use pretty_assertions::assert_eq;

    fn ok(body: serde_json::Value) -> Reply {
        Reply::Respond(ApiResponse::json_body(200, &body))
    }

    fn user_json() -> serde_json::Value {
        json!({"id": 7, "email": "ada@example.com", "first_name": "Ada", "last_name": "Lovelace"})
    }

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            username: "ada_l".into(),
            email: "ada@example.com".into(),
            password: "Analytic4!".into(),
            confirm_password: "Analytic4!".into(),
        }
    }

    #[tokio::test]
    async fn login_stores_credentials_and_returns_embedded_user() {
        let harness = Harness::new(|_: &PreparedRequest| {
            ok(json!({
                "access_token": "a-1",
                "refresh_token": "r-1",
                "session_id": 42,
                "user": user_json(),
            }))
        });

        let user = harness.client.session().login("ada@example.com", "pw").await.unwrap();

        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(harness.credentials().access_token().as_deref(), Some("a-1"));
        assert_eq!(harness.credentials().refresh_token().as_deref(), Some("r-1"));
        assert_eq!(harness.credentials().session_id().as_deref(), Some("42"));

        let sent = harness.transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].body,
            Some(json!({"email": "ada@example.com", "password": "pw"}))
        );
    }

    #[tokio::test]
    async fn login_without_user_fetches_current_user() {
        let harness = Harness::new(|request: &PreparedRequest| match request.url.path() {
            "/api/auth/login" => ok(json!({"access_token": "a-1"})),
            _ => ok(json!({"user": user_json()})),
        });

        let user = harness.client.session().login("ada@example.com", "pw").await.unwrap();

        assert_eq!(user.id.as_deref(), Some("7"));
        let sent = harness.transport.requests();
        assert_eq!(sent[1].url.path(), "/api/auth/me");
        assert_eq!(sent[1].headers.get("Authorization"), Some("Bearer a-1"));
    }

    #[tokio::test]
    async fn login_without_access_token_fails_and_clears_token() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({"user": user_json()})));
        harness.credentials().store_access_token("leftover").unwrap();

        let err = harness.client.session().login("ada@example.com", "pw").await.unwrap_err();

        assert!(matches!(err, ApiError::MissingAccessToken));
        assert_eq!(harness.credentials().access_token(), None);
    }

    #[tokio::test]
    async fn bad_credentials_do_not_trigger_refresh() {
        let harness = Harness::new(|_: &PreparedRequest| {
            Reply::Respond(ApiResponse::json_body(401, &json!({"error": "bad credentials"})))
        });
        harness.sign_in("old", "refresh", None);

        let err = harness.client.session().login("ada@example.com", "nope").await.unwrap_err();

        assert_eq!(err.status_code(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(harness.transport.requests().len(), 1);
        assert_eq!(harness.credentials().refresh_token().as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn logout_sends_session_id_and_clears_everything() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({})));
        harness.sign_in("a", "r", Some("sess-9"));

        harness.client.session().logout().await;

        let sent = harness.transport.requests();
        assert_eq!(sent[0].url.path(), "/api/auth/logout");
        assert_eq!(sent[0].headers.get("X-Session-ID"), Some("sess-9"));
        assert!(harness.store.is_empty());
        assert_eq!(harness.navigator.routes(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn logout_completes_when_server_is_unreachable() {
        let harness = Harness::new(|_: &PreparedRequest| Reply::Fail);
        harness.sign_in("a", "r", Some("s"));

        harness.client.session().logout().await;

        assert!(harness.store.is_empty());
        assert_eq!(harness.navigator.routes(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn invalid_registration_is_not_sent() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({})));
        let form = RegistrationForm {
            username: "a!".into(),
            confirm_password: "different".into(),
            ..valid_form()
        };

        let err = harness.client.session().register(&form).await.unwrap_err();

        let ApiError::Validation(errors) = err else {
            panic!("expected validation errors");
        };
        assert!(errors.get(RegistrationField::Username).is_some());
        assert!(errors.get(RegistrationField::ConfirmPassword).is_some());
        assert!(harness.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn registration_omits_confirmation() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({"message": "check your inbox"})));

        harness.client.session().register(&valid_form()).await.unwrap();

        let body = harness.transport.requests()[0].body.clone().unwrap();
        assert_eq!(body["username"], "ada_l");
        assert!(body.get("confirm_password").is_none());
    }

    #[tokio::test]
    async fn forgot_password_returns_server_message() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({"message": "Reset link sent"})));

        let message = harness
            .client
            .session()
            .forgot_password("ada@example.com")
            .await
            .unwrap();

        assert_eq!(message, "Reset link sent");
        assert_eq!(
            harness.transport.requests()[0].body,
            Some(json!({"email": "ada@example.com"}))
        );
    }

    #[tokio::test]
    async fn reset_password_posts_both_entries_to_the_token_path() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({"message": "Password updated"})));
        let reset = PasswordReset {
            password: "Analytic5!".into(),
            confirm_password: "Analytic5!".into(),
        };

        let message = harness
            .client
            .session()
            .reset_password("rst-123", &reset)
            .await
            .unwrap();

        assert_eq!(message, "Password updated");
        let sent = harness.transport.requests();
        assert_eq!(sent[0].url.path(), "/api/auth/reset-password/rst-123");
        assert_eq!(
            sent[0].body,
            Some(json!({"password": "Analytic5!", "confirm_password": "Analytic5!"}))
        );
    }

    #[tokio::test]
    async fn mismatched_reset_is_not_sent() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({})));
        let reset = PasswordReset {
            password: "Analytic5!".into(),
            confirm_password: "Analytic6!".into(),
        };

        let err = harness
            .client
            .session()
            .reset_password("rst-123", &reset)
            .await
            .unwrap_err();

        let ApiError::Validation(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(
            errors.get(RegistrationField::ConfirmPassword),
            Some("Passwords do not match")
        );
        assert!(harness.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn verify_email_gets_the_token_path() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({"message": "Email verified"})));

        let message = harness.client.session().verify_email("vfy-9").await.unwrap();

        assert_eq!(message, "Email verified");
        let sent = harness.transport.requests();
        assert_eq!(sent[0].method, cogni_domain::HttpMethod::Get);
        assert_eq!(sent[0].url.path(), "/api/auth/verify-email/vfy-9");
    }

    #[tokio::test]
    async fn expired_verification_link_surfaces_the_server_error() {
        let harness = Harness::new(|_: &PreparedRequest| {
            Reply::Respond(ApiResponse::json_body(400, &json!({"error": "link expired"})))
        });

        let err = harness.client.session().verify_email("old").await.unwrap_err();

        assert_eq!(err.status_code(), Some(StatusCode(400)));
        assert_eq!(err.response().unwrap().text(), r#"{"error":"link expired"}"#);
    }

    #[tokio::test]
    async fn resend_verification_posts_the_email() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({"message": "Verification sent"})));

        let message = harness
            .client
            .session()
            .resend_verification("ada@example.com")
            .await
            .unwrap();

        assert_eq!(message, "Verification sent");
        let sent = harness.transport.requests();
        assert_eq!(sent[0].url.path(), "/api/auth/resend-verification");
        assert_eq!(sent[0].body, Some(json!({"email": "ada@example.com"})));
    }

    #[tokio::test]
    async fn current_user_accepts_bare_object() {
        let harness = Harness::new(|_: &PreparedRequest| ok(user_json()));
        let user = harness.client.session().current_user().await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn restore_uses_refresh_token_when_access_token_is_gone() {
        let harness = Harness::new(|request: &PreparedRequest| match request.url.path() {
            "/api/auth/refresh" => ok(json!({"access_token": "fresh"})),
            _ => ok(user_json()),
        });
        harness
            .credentials()
            .put(CredentialKey::RefreshToken, "r")
            .unwrap();

        let user = harness.client.session().restore().await;

        assert!(user.is_some());
        let paths: Vec<String> = harness
            .transport
            .requests()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(paths, vec!["/api/auth/refresh", "/api/auth/me"]);
    }

    #[tokio::test]
    async fn restore_without_credentials_is_signed_out() {
        let harness = Harness::new(|_: &PreparedRequest| ok(user_json()));
        assert!(harness.client.session().restore().await.is_none());
        assert!(harness.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn social_login_url_points_at_backend() {
        let harness = Harness::new(|_: &PreparedRequest| ok(json!({})));
        let url = harness
            .client
            .session()
            .social_login_url(SocialProvider::Google)
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/auth/oauth/google");
    }

    #[tokio::test]
    async fn oauth_callback_stores_tokens_and_fetches_user() {
        let harness = Harness::new(|_: &PreparedRequest| ok(user_json()));
        let callback =
            Url::parse("http://localhost:3000/oauth/callback?token=t-1&refresh_token=r-1&session_id=5")
                .unwrap();

        let user = harness
            .client
            .session()
            .complete_oauth_callback(&callback)
            .await
            .unwrap();

        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(harness.credentials().access_token().as_deref(), Some("t-1"));
        assert_eq!(harness.credentials().refresh_token().as_deref(), Some("r-1"));
        assert_eq!(harness.credentials().session_id().as_deref(), Some("5"));
        assert!(harness.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn oauth_callback_without_token_returns_to_login() {
        let harness = Harness::new(|_: &PreparedRequest| ok(user_json()));
        let callback = Url::parse("http://localhost:3000/oauth/callback").unwrap();

        let err = harness
            .client
            .session()
            .complete_oauth_callback(&callback)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::MissingCallbackToken));
        assert_eq!(
            harness.navigator.routes(),
            vec!["/login?error=oauth_failed".to_string()]
        );
        assert!(harness.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn oauth_callback_with_provider_error_returns_to_login() {
        let harness = Harness::new(|_: &PreparedRequest| ok(user_json()));
        let callback =
            Url::parse("http://localhost:3000/oauth/callback?error=access_denied").unwrap();

        let err = harness
            .client
            .session()
            .complete_oauth_callback(&callback)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::CallbackRejected(reason) if reason == "access_denied"));
        assert_eq!(harness.navigator.routes().len(), 1);
    }
}
