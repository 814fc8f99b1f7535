//! Cookie types backing credential storage.
//!
//! Credentials are kept the way a browser keeps them: one cookie per
//! credential, each with its own lifetime. Expiry is always evaluated
//! against a caller-supplied instant so stores can run on an injected clock.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single stored cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Expiration time (None for session cookies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// SameSite attribute.
    #[serde(default)]
    pub same_site: SameSite,
}

impl Cookie {
    /// Create a new session cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
            secure: false,
            same_site: SameSite::default(),
        }
    }

    /// Set the expiration.
    #[must_use]
    pub const fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Expire `days` after `now`.
    #[must_use]
    pub fn expiring_in_days(self, now: DateTime<Utc>, days: i64) -> Self {
        self.with_expires(now + Duration::days(days))
    }

    /// Set Secure flag.
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set SameSite attribute.
    #[must_use]
    pub const fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Check if the cookie has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|exp| exp <= now)
    }

    /// Check if this is a session cookie (no expiration).
    #[must_use]
    pub const fn is_session(&self) -> bool {
        self.expires.is_none()
    }
}

/// SameSite attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Cookies are sent with all requests.
    None,
    /// Cookies are sent with top-level navigations.
    #[default]
    Lax,
    /// Cookies are only sent in first-party context.
    Strict,
}

/// Cookie jar keyed by cookie name.
///
/// A `BTreeMap` keeps the serialized form stable across writes.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CookieJar {
    #[serde(default)]
    cookies: BTreeMap<String, Cookie>,
}

impl CookieJar {
    /// Create a new empty cookie jar.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cookies: BTreeMap::new(),
        }
    }

    /// Store a cookie, replacing one with the same name.
    ///
    /// A cookie already expired at `now` deletes the existing entry instead.
    pub fn set(&mut self, cookie: Cookie, now: DateTime<Utc>) {
        if cookie.is_expired_at(now) {
            self.cookies.remove(&cookie.name);
            return;
        }
        self.cookies.insert(cookie.name.clone(), cookie);
    }

    /// Get a live cookie by name.
    #[must_use]
    pub fn get(&self, name: &str, now: DateTime<Utc>) -> Option<&Cookie> {
        self.cookies.get(name).filter(|c| !c.is_expired_at(now))
    }

    /// Remove a cookie by name.
    pub fn remove(&mut self, name: &str) -> Option<Cookie> {
        self.cookies.remove(name)
    }

    /// Clear all cookies.
    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Remove expired cookies, returning how many were dropped.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.cookies.len();
        self.cookies.retain(|_, c| !c.is_expired_at(now));
        before - self.cookies.len()
    }

    /// Names of all stored cookies.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    /// Get the total number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Check if the jar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
