//! File-backed credential store.
//!
//! The jar is kept in memory and written through to a JSON file on every
//! change, so a CLI session survives between invocations:
//! ```json
//! {
//!   "cookies": {
//!     "token": {
//!       "name": "token",
//!       "value": "eyJ...",
//!       "expires": "2026-01-02T00:00:00Z",
//!       "secure": false,
//!       "same_site": "Strict"
//!     }
//!   }
//! }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cogni_application::ports::{Clock, CredentialStore, StoreError};
use cogni_domain::{Cookie, CookieJar};
use parking_lot::Mutex;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// Cookie jar persisted to a single JSON file.
pub struct FileCredentialStore {
    path: PathBuf,
    jar: Mutex<CookieJar>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FileCredentialStore {
    /// Opens the jar at `path`, creating nothing until the first write.
    ///
    /// Cookies that expired while the file sat on disk are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Corrupt`] if it does not hold a cookie jar.
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut jar = match fs::read(&path) {
            Ok(bytes) => from_json_bytes::<CookieJar>(&bytes)
                .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == ErrorKind::NotFound => CookieJar::new(),
            Err(e) => return Err(e.into()),
        };

        let purged = jar.purge_expired(clock.now());
        let store = Self {
            path,
            jar: Mutex::new(jar),
            clock,
        };
        if purged > 0 {
            tracing::debug!(purged, path = %store.path.display(), "Dropped expired cookies");
            store.persist(&store.jar.lock())?;
        }
        Ok(store)
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the jar to a sibling temp file and renames it into place.
    fn persist(&self, jar: &CookieJar) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = to_json_stable_bytes(jar).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content)?;

        // Owner read/write only; the jar holds the refresh token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError> {
        Ok(self.jar.lock().get(name, self.clock.now()).cloned())
    }

    fn set(&self, cookie: Cookie) -> Result<(), StoreError> {
        let mut jar = self.jar.lock();
        jar.set(cookie, self.clock.now());
        self.persist(&jar)
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        let mut jar = self.jar.lock();
        if jar.remove(name).is_none() {
            return Ok(());
        }
        self.persist(&jar)
    }
}
