//! Cookie-backed session credentials.
//!
//! Wraps a [`CredentialStore`] with the naming, lifetime and flag rules for
//! the three session cookies. Reads never fail: a storage error is logged
//! and the credential is treated as absent, which sends the caller down the
//! signed-out path.

use std::sync::Arc;

use cogni_domain::{Cookie, CredentialKey, SameSite, SessionStatus, TokenClaims, TokenGrant};

use crate::ports::{Clock, CredentialStore, StoreError};

/// Access to the stored access token, refresh token and session id.
#[derive(Clone)]
pub struct SessionCredentials {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    secure: bool,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionCredentials {
    /// Creates a credential view over `store`.
    ///
    /// `secure` sets the `Secure` flag on every cookie written.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>, secure: bool) -> Self {
        Self {
            store,
            clock,
            secure,
        }
    }

    /// Reads a credential, falling back to its legacy cookie names.
    #[must_use]
    pub fn get(&self, key: CredentialKey) -> Option<String> {
        std::iter::once(key.cookie_name())
            .chain(key.legacy_names().iter().copied())
            .find_map(|name| match self.store.get(name) {
                Ok(cookie) => cookie.map(|c| c.value),
                Err(e) => {
                    tracing::warn!(cookie = name, error = %e, "Failed to read credential");
                    None
                }
            })
            .filter(|value| !value.is_empty())
    }

    /// Current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.get(CredentialKey::AccessToken)
    }

    /// Current refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.get(CredentialKey::RefreshToken)
    }

    /// Current server session id.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.get(CredentialKey::SessionId)
    }

    /// Writes one credential cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub fn put(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        let cookie = Cookie::new(key.cookie_name(), value)
            .expiring_in_days(self.clock.now(), key.lifetime_days())
            .with_secure(self.secure)
            .with_same_site(SameSite::Strict);
        self.store.set(cookie)
    }

    /// Replaces the access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub fn store_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.put(CredentialKey::AccessToken, token)
    }

    /// Stores every credential present in a login or refresh grant.
    ///
    /// Absent fields leave the existing cookie untouched.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub fn store_grant(&self, grant: &TokenGrant) -> Result<(), StoreError> {
        for (key, value) in [
            (CredentialKey::AccessToken, &grant.access_token),
            (CredentialKey::RefreshToken, &grant.refresh_token),
            (CredentialKey::SessionId, &grant.session_id),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                self.put(key, value)?;
            }
        }
        Ok(())
    }

    /// Removes the access token, including legacy names.
    pub fn clear_access_token(&self) {
        self.remove(CredentialKey::AccessToken);
    }

    /// Removes every credential. Failures are logged and skipped.
    pub fn clear_all(&self) {
        for key in CredentialKey::ALL {
            self.remove(key);
        }
    }

    fn remove(&self, key: CredentialKey) {
        for name in std::iter::once(key.cookie_name()).chain(key.legacy_names().iter().copied()) {
            if let Err(e) = self.store.remove(name) {
                tracing::warn!(cookie = name, error = %e, "Failed to remove credential");
            }
        }
    }

    /// Subject claim of the access token, if it decodes.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.access_token()
            .and_then(|token| TokenClaims::decode(&token).ok())
            .and_then(|claims| claims.subject)
    }

    /// Summarises the stored credentials.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        let refresh = self.refresh_token();
        let Some(access) = self.access_token() else {
            return match refresh {
                Some(_) => SessionStatus::Expired { can_refresh: true },
                None => SessionStatus::SignedOut,
            };
        };

        let now = self.clock.now();
        match TokenClaims::decode(&access) {
            Ok(claims) if !claims.is_expired_at(now) => SessionStatus::Active {
                seconds_remaining: claims.seconds_until_expiry(now),
                user_id: claims.subject,
                has_session_id: self.session_id().is_some(),
            },
            _ => SessionStatus::Expired {
                can_refresh: refresh.is_some(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, TestClock, fake_jwt};
    use pretty_assertions::assert_eq;

    fn credentials() -> (SessionCredentials, Arc<MemoryStore>, Arc<TestClock>) {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(TestClock::at_epoch(1_700_000_000));
        (
            SessionCredentials::new(store.clone(), clock.clone(), true),
            store,
            clock,
        )
    }

    #[test]
    fn writes_cookies_with_lifetimes_and_flags() {
        let (creds, store, clock) = credentials();
        creds
            .store_grant(&TokenGrant {
                access_token: Some("a".into()),
                refresh_token: Some("r".into()),
                session_id: Some("42".into()),
                user: None,
            })
            .unwrap();

        let token = store.cookie("token").unwrap();
        assert_eq!(token.expires, Some(clock.now() + chrono::Duration::days(1)));
        assert!(token.secure);
        assert_eq!(token.same_site, SameSite::Strict);

        let refresh = store.cookie("refresh_token").unwrap();
        assert_eq!(refresh.expires, Some(clock.now() + chrono::Duration::days(30)));
        assert_eq!(creds.session_id().as_deref(), Some("42"));
    }

    #[test]
    fn partial_grant_keeps_existing_refresh_token() {
        let (creds, _, _) = credentials();
        creds.put(CredentialKey::RefreshToken, "old-refresh").unwrap();
        creds
            .store_grant(&TokenGrant {
                access_token: Some("fresh".into()),
                ..TokenGrant::default()
            })
            .unwrap();

        assert_eq!(creds.access_token().as_deref(), Some("fresh"));
        assert_eq!(creds.refresh_token().as_deref(), Some("old-refresh"));
    }

    #[test]
    fn reads_legacy_access_token_name() {
        let (creds, store, _) = credentials();
        store.insert(Cookie::new("access_token", "legacy"));
        assert_eq!(creds.access_token().as_deref(), Some("legacy"));

        creds.clear_access_token();
        assert_eq!(creds.access_token(), None);
    }

    #[test]
    fn clear_all_removes_every_credential() {
        let (creds, store, _) = credentials();
        creds.put(CredentialKey::AccessToken, "a").unwrap();
        creds.put(CredentialKey::RefreshToken, "r").unwrap();
        creds.put(CredentialKey::SessionId, "s").unwrap();

        creds.clear_all();
        assert!(store.is_empty());
    }

    #[test]
    fn status_reflects_token_expiry() {
        let (creds, _, clock) = credentials();
        assert_eq!(creds.status(), SessionStatus::SignedOut);

        let exp = clock.now().timestamp() + 600;
        creds.store_access_token(&fake_jwt("user-7", exp)).unwrap();
        assert_eq!(
            creds.status(),
            SessionStatus::Active {
                user_id: Some("user-7".into()),
                seconds_remaining: Some(600),
                has_session_id: false,
            }
        );
        assert_eq!(creds.user_id().as_deref(), Some("user-7"));

        clock.advance(std::time::Duration::from_secs(601));
        assert_eq!(creds.status(), SessionStatus::Expired { can_refresh: false });

        creds.put(CredentialKey::RefreshToken, "r").unwrap();
        assert_eq!(creds.status(), SessionStatus::Expired { can_refresh: true });
    }

    #[test]
    fn opaque_access_token_counts_as_expired() {
        let (creds, _, _) = credentials();
        creds.store_access_token("not-a-jwt").unwrap();
        assert_eq!(creds.status(), SessionStatus::Expired { can_refresh: false });
    }
}
