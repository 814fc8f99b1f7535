//! In-memory fakes for the application ports.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use cogni_domain::{ApiResponse, Cookie, CredentialKey, PreparedRequest};
use parking_lot::Mutex;

use crate::auth::SessionCredentials;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::ports::{Clock, CredentialStore, HttpTransport, Navigator, StoreError, TransportError};

/// What the scripted backend does with one request.
pub enum Reply {
    Respond(ApiResponse),
    After(Duration, ApiResponse),
    Hang,
    Fail,
}

type Handler = Box<dyn Fn(&PreparedRequest) -> Reply + Send + Sync>;

/// Transport answering from a closure and recording every request.
pub struct ScriptedTransport {
    handler: Handler,
    sent: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&PreparedRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().push(request.clone());
        match (self.handler)(request) {
            Reply::Respond(response) => Ok(response),
            Reply::After(delay, response) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Reply::Hang => std::future::pending().await,
            Reply::Fail => Err(TransportError::ConnectionRefused {
                host: request.url.host_str().unwrap_or_default().to_string(),
                port: request.url.port_or_known_default().unwrap_or_default(),
            }),
        }
    }
}

/// Cookie store without expiry handling.
#[derive(Default)]
pub struct MemoryStore {
    cookies: Mutex<BTreeMap<String, Cookie>>,
}

impl MemoryStore {
    pub fn insert(&self, cookie: Cookie) {
        self.cookies.lock().insert(cookie.name.clone(), cookie);
    }

    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.cookies.lock().get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.lock().is_empty()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError> {
        Ok(self.cookie(name))
    }

    fn set(&self, cookie: Cookie) -> Result<(), StoreError> {
        self.insert(cookie);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.cookies.lock().remove(name);
        Ok(())
    }
}

/// Store whose reads always fail; writes and removals succeed and are dropped.
#[derive(Default)]
pub struct UnreadableStore;

impl CredentialStore for UnreadableStore {
    fn get(&self, name: &str) -> Result<Option<Cookie>, StoreError> {
        Err(StoreError::Corrupt(format!("cannot decode {name}")))
    }

    fn set(&self, _cookie: Cookie) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove(&self, _name: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Clock frozen at an epoch; only `advance` and `rewind` move it.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn at_epoch(seconds: i64) -> Self {
        Self {
            now: Mutex::new(DateTime::from_timestamp(seconds, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += chrono::Duration::from_std(by).unwrap();
    }

    pub fn rewind(&self, by: Duration) {
        *self.now.lock() -= chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Navigator remembering every route it was sent to.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}

/// Unsigned JWT with the given subject and expiry.
pub fn fake_jwt(subject: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{subject}","exp":{exp}}}"#));
    format!("{header}.{payload}.signature")
}

/// A client wired to in-memory fakes.
pub struct Harness {
    pub client: Arc<ApiClient>,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<TestClock>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(handler: impl Fn(&PreparedRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self::try_with_config(ClientConfig::default(), handler).unwrap()
    }

    pub fn try_with_config(
        config: ClientConfig,
        handler: impl Fn(&PreparedRequest) -> Reply + Send + Sync + 'static,
    ) -> ApiResult<Self> {
        let transport = Arc::new(ScriptedTransport::new(handler));
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(TestClock::at_epoch(1_700_000_000));
        let navigator = Arc::new(RecordingNavigator::default());
        let client = ApiClient::new(
            config,
            transport.clone(),
            store.clone(),
            clock.clone(),
            navigator.clone(),
        )?;

        Ok(Self {
            client: Arc::new(client),
            transport,
            store,
            clock,
            navigator,
        })
    }

    pub fn credentials(&self) -> &SessionCredentials {
        self.client.credentials()
    }

    pub fn sign_in(&self, access: &str, refresh: &str, session_id: Option<&str>) {
        let creds = self.credentials();
        creds.put(CredentialKey::AccessToken, access).unwrap();
        creds.put(CredentialKey::RefreshToken, refresh).unwrap();
        if let Some(session_id) = session_id {
            creds.put(CredentialKey::SessionId, session_id).unwrap();
        }
    }
}
