//! Session credential and auth endpoint payload types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DomainError, DomainResult};

/// The three credentials a signed-in client holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Short-lived bearer token sent on every API call.
    AccessToken,
    /// Longer-lived token used only to mint new access tokens.
    RefreshToken,
    /// Server-side session identifier sent as `X-Session-ID`.
    SessionId,
}

impl CredentialKey {
    /// All keys, in the order they are cleared on logout.
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::SessionId];

    /// Cookie name the credential is stored under.
    #[must_use]
    pub const fn cookie_name(self) -> &'static str {
        match self {
            Self::AccessToken => "token",
            Self::RefreshToken => "refresh_token",
            Self::SessionId => "session_id",
        }
    }

    /// Older cookie names still honoured on read.
    #[must_use]
    pub const fn legacy_names(self) -> &'static [&'static str] {
        match self {
            Self::AccessToken => &["access_token"],
            Self::RefreshToken | Self::SessionId => &[],
        }
    }

    /// Cookie lifetime in days.
    #[must_use]
    pub const fn lifetime_days(self) -> i64 {
        match self {
            Self::AccessToken => 1,
            Self::RefreshToken | Self::SessionId => 30,
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cookie_name())
    }
}

/// Body of `POST /api/auth/refresh` and `POST /api/auth/login` responses.
///
/// Every field is optional on the wire; callers decide which absences are
/// errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Newly issued access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Rotated refresh token, when the server rotates them.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Session identifier; the backend sends it as a number or a string.
    #[serde(default, deserialize_with = "string_or_number")]
    pub session_id: Option<String>,
    /// Profile of the signed-in user, when included.
    #[serde(default)]
    pub user: Option<User>,
}

/// Profile returned by `GET /api/auth/me` and embedded in login responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier (numeric or string).
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Every other field the backend sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Name suitable for a greeting line.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name, &self.username, &self.email) {
            (Some(first), Some(last), _, _) => format!("{first} {last}"),
            (Some(first), None, _, _) => first.clone(),
            (None, _, Some(username), _) => username.clone(),
            (None, _, None, Some(email)) => email.clone(),
            _ => "unknown user".to_string(),
        }
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Body of `POST /api/auth/forgot-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Account email.
    pub email: String,
}

/// Body of `POST /api/auth/resend-verification`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendVerificationRequest {
    /// Address the verification link goes to.
    pub email: String,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message from the server.
    #[serde(default)]
    pub message: String,
}

/// Third-party identity providers with a backend OAuth entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialProvider {
    /// Google sign-in.
    Google,
}

impl SocialProvider {
    /// Path segment used by the backend OAuth route.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

impl FromStr for SocialProvider {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            other => Err(DomainError::UnsupportedProvider(other.to_string())),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn cookie_names_match_browser_storage() {
        assert_eq!(CredentialKey::AccessToken.cookie_name(), "token");
        assert_eq!(CredentialKey::AccessToken.legacy_names(), &["access_token"]);
        assert_eq!(CredentialKey::RefreshToken.lifetime_days(), 30);
        assert_eq!(CredentialKey::AccessToken.lifetime_days(), 1);
    }

    #[test]
    fn numeric_session_ids_become_strings() {
        let grant: TokenGrant = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "session_id": 42,
            "user": {"id": 7, "email": "ada@example.com", "role": "student"}
        }))
        .unwrap();

        assert_eq!(grant.session_id.as_deref(), Some("42"));
        let user = grant.user.unwrap();
        assert_eq!(user.id.as_deref(), Some("7"));
        assert_eq!(user.extra["role"], "student");
    }

    #[test]
    fn missing_fields_are_none() {
        let grant: TokenGrant = serde_json::from_value(json!({})).unwrap();
        assert_eq!(grant, TokenGrant::default());
    }

    #[test]
    fn display_name_prefers_full_name() {
        let user = User {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            username: Some("ada".into()),
            ..User::default()
        };
        assert_eq!(user.display_name(), "Ada Lovelace");

        let user = User {
            email: Some("ada@example.com".into()),
            ..User::default()
        };
        assert_eq!(user.display_name(), "ada@example.com");
    }

    #[test]
    fn only_google_is_supported() {
        assert_eq!("Google".parse::<SocialProvider>().unwrap(), SocialProvider::Google);
        assert!(matches!(
            "github".parse::<SocialProvider>(),
            Err(DomainError::UnsupportedProvider(_))
        ));
    }
}
