//! Unverified inspection of JWT access tokens.
//!
//! The client cannot check signatures; it only reads the payload to learn
//! when a token expires and whom it was issued to, so that obviously stale
//! or malformed tokens are dropped before they are sent.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{DomainError, DomainResult};

/// JWT segments use URL-safe base64; some issuers keep the padding.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims the client reads from an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user identifier).
    pub subject: Option<String>,
    /// Expiry as a Unix timestamp in seconds.
    pub expires_at: Option<i64>,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<serde_json::Value>,
    #[serde(default)]
    exp: Option<serde_json::Number>,
}

impl TokenClaims {
    /// Decodes the payload segment of a JWT without verifying it.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MalformedToken`] if the token does not have
    /// three segments or the payload is not base64url-encoded JSON.
    pub fn decode(token: &str) -> DomainResult<Self> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(DomainError::MalformedToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        let payload = SEGMENT_ENGINE
            .decode(segments[1])
            .map_err(|e| DomainError::MalformedToken(format!("payload is not base64url: {e}")))?;
        let raw: RawClaims = serde_json::from_slice(&payload)
            .map_err(|e| DomainError::MalformedToken(format!("payload is not JSON: {e}")))?;

        let subject = match raw.sub {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        // Some issuers emit fractional `exp`; truncation is fine at second precision.
        #[allow(clippy::cast_possible_truncation)]
        let expires_at = raw
            .exp
            .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)));

        Ok(Self {
            subject,
            expires_at,
        })
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Returns true if the token has expired at `now`. Tokens without `exp` never expire.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry().is_some_and(|exp| exp <= now)
    }

    /// Seconds left before expiry, negative once expired.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expiry().map(|exp| (exp - now).num_seconds())
    }
}

/// First characters of a token, safe to write to logs.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.len() > 12 {
        let cut = token
            .char_indices()
            .nth(8)
            .map_or(token.len(), |(idx, _)| idx);
        format!("{}...", &token[..cut])
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn jwt(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn reads_subject_and_expiry() {
        let claims = TokenClaims::decode(&jwt(&json!({"sub": "user-1", "exp": 1_700_000_000}))).unwrap();
        assert_eq!(claims.subject.as_deref(), Some("user-1"));
        assert_eq!(claims.expires_at, Some(1_700_000_000));
    }

    #[test]
    fn numeric_subjects_are_stringified() {
        let claims = TokenClaims::decode(&jwt(&json!({"sub": 12}))).unwrap();
        assert_eq!(claims.subject.as_deref(), Some("12"));
        assert_eq!(claims.expires_at, None);
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(
            TokenClaims::decode("not-a-jwt"),
            Err(DomainError::MalformedToken(_))
        ));
        assert!(TokenClaims::decode("a.b.c.d").is_err());
    }

    #[test]
    fn rejects_non_json_payload() {
        let token = format!("x.{}.y", URL_SAFE_NO_PAD.encode("plain text"));
        assert!(matches!(
            TokenClaims::decode(&token),
            Err(DomainError::MalformedToken(_))
        ));
    }

    #[test]
    fn expiry_is_compared_against_the_given_instant() {
        let claims = TokenClaims::decode(&jwt(&json!({"exp": 1_000}))).unwrap();
        let before = DateTime::<Utc>::from_timestamp(900, 0).unwrap();
        let after = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();

        assert!(!claims.is_expired_at(before));
        assert_eq!(claims.seconds_until_expiry(before), Some(100));
        assert!(claims.is_expired_at(after));
    }

    #[test]
    fn previews_hide_most_of_the_token() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("short"), "***");
    }
}
