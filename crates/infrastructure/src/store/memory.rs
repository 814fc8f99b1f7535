//! In-process credential store.

use std::sync::Arc;

use cogni_application::ports::{Clock, CredentialStore, StoreError};
use cogni_domain::{Cookie, CookieJar};
use parking_lot::Mutex;

/// Cookie jar that lives as long as the process.
pub struct MemoryCredentialStore {
    jar: Mutex<CookieJar>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("cookies", &self.jar.lock().len())
            .finish_non_exhaustive()
    }
}

impl MemoryCredentialStore {
    /// Creates an empty store evaluating expiry with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            jar: Mutex::new(CookieJar::new()),
            clock,
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError> {
        Ok(self.jar.lock().get(name, self.clock.now()).cloned())
    }

    fn set(&self, cookie: Cookie) -> Result<(), StoreError> {
        self.jar.lock().set(cookie, self.clock.now());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.jar.lock().remove(name);
        Ok(())
    }
}
