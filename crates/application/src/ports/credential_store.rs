//! Credential storage port

use cogni_domain::Cookie;
use thiserror::Error;

/// Errors raised by credential stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("credential storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be decoded or encoded.
    #[error("credential storage is corrupt: {0}")]
    Corrupt(String),
}

/// Port for the cookie-backed credential storage.
///
/// Access is synchronous: the request decorator reads credentials on every
/// call and must never suspend. Stores are responsible for hiding expired
/// cookies.
pub trait CredentialStore: Send + Sync {
    /// Returns the live cookie with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError>;

    /// Stores a cookie, replacing any cookie with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, cookie: Cookie) -> Result<(), StoreError>;

    /// Removes a cookie. Removing a missing cookie is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, name: &str) -> Result<(), StoreError>;
}
