//! Single-flight token refresh.
//!
//! At most one refresh call is in flight per coordinator. A caller that
//! needs a new token while a refresh is running joins it and waits on the
//! flight's `watch` channel, bounded by its own timeout. A new refresh is
//! refused while the previous attempt is younger than the cooldown window.
//!
//! The state mutex is only held for synchronous check-then-set sections,
//! never across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cogni_domain::{ApiRequest, RefreshState, TokenGrant, token_preview};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::Instant;
use url::Url;

use super::SessionCredentials;
use crate::config::ClientConfig;
use crate::error::RefreshError;
use crate::ports::{Clock, HttpTransport, Navigator};

/// Outcome of one refresh, as seen by joiners.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Flight {
    Pending,
    Refreshed(String),
    Failed,
}

#[derive(Debug, Default)]
struct FlightState {
    last_attempt: Option<DateTime<Utc>>,
    in_flight: Option<watch::Receiver<Flight>>,
}

enum Role<'a> {
    Lead(FlightGuard<'a>),
    Join(watch::Receiver<Flight>),
}

/// Clears the in-flight marker when the leading call finishes or is dropped.
struct FlightGuard<'a> {
    state: &'a Mutex<FlightState>,
    tx: watch::Sender<Flight>,
    rx: watch::Receiver<Flight>,
}

impl FlightGuard<'_> {
    fn finish(self, outcome: &Result<String, RefreshError>) {
        let flight = match outcome {
            Ok(token) => Flight::Refreshed(token.clone()),
            Err(_) => Flight::Failed,
        };
        self.release();
        self.tx.send_replace(flight);
    }

    /// Clears the marker only while it still points at this flight.
    fn release(&self) {
        let mut state = self.state.lock();
        if state
            .in_flight
            .as_ref()
            .is_some_and(|current| current.same_channel(&self.rx))
        {
            state.in_flight = None;
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.release();
        if *self.tx.borrow() == Flight::Pending {
            self.tx.send_replace(Flight::Failed);
        }
    }
}

/// Mints new access tokens from the stored refresh token.
pub struct RefreshCoordinator {
    transport: Arc<dyn HttpTransport>,
    credentials: SessionCredentials,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    base_url: Url,
    refresh_path: String,
    login_route: String,
    cooldown: Duration,
    wait_timeout: Duration,
    request_timeout: Duration,
    state: Mutex<FlightState>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_path", &self.refresh_path)
            .field("cooldown", &self.cooldown)
            .field("wait_timeout", &self.wait_timeout)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Creates a coordinator. `base_url` must be the parsed `config.base_url`.
    #[must_use]
    pub fn new(
        config: &ClientConfig,
        base_url: Url,
        transport: Arc<dyn HttpTransport>,
        credentials: SessionCredentials,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            credentials,
            navigator,
            clock,
            base_url,
            refresh_path: config.refresh_path.clone(),
            login_route: config.login_route.clone(),
            cooldown: config.refresh_cooldown(),
            wait_timeout: config.refresh_wait_timeout(),
            request_timeout: config.request_timeout(),
            state: Mutex::new(FlightState::default()),
        }
    }

    /// Observable coordinator state.
    #[must_use]
    pub fn state(&self) -> RefreshState {
        let state = self.state.lock();
        if state.in_flight.is_some() {
            return RefreshState::Refreshing;
        }
        match self.cooldown_remaining(state.last_attempt) {
            Some(remaining) => RefreshState::CoolingDown {
                remaining_ms: millis(remaining),
            },
            None => RefreshState::Idle,
        }
    }

    /// Returns a fresh access token.
    ///
    /// Joins the in-flight refresh if there is one, otherwise starts a new
    /// refresh unless the cooldown window is still open.
    ///
    /// # Errors
    ///
    /// Returns a [`RefreshError`] describing why no token was obtained. On
    /// [`RefreshError::MissingRefreshToken`] and [`RefreshError::Rejected`]
    /// the stored credentials have been cleared and the navigator sent to
    /// the login route.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        match self.begin()? {
            Role::Lead(guard) => {
                let outcome = self.perform().await;
                guard.finish(&outcome);
                outcome
            }
            Role::Join(rx) => self.join(rx).await,
        }
    }

    fn begin(&self) -> Result<Role<'_>, RefreshError> {
        let mut state = self.state.lock();

        if let Some(rx) = &state.in_flight {
            tracing::debug!("Refresh already in flight, waiting");
            return Ok(Role::Join(rx.clone()));
        }

        let now = self.clock.now();
        if let Some(elapsed) = state.last_attempt.map(|last| elapsed_between(last, now))
            && elapsed < self.cooldown
        {
            tracing::warn!(
                elapsed_ms = millis(elapsed),
                "Refresh attempted too recently, skipping"
            );
            return Err(RefreshError::CoolingDown {
                elapsed_ms: millis(elapsed),
                cooldown_ms: millis(self.cooldown),
            });
        }

        state.last_attempt = Some(now);
        let (tx, rx) = watch::channel(Flight::Pending);
        state.in_flight = Some(rx.clone());
        Ok(Role::Lead(FlightGuard {
            state: &self.state,
            tx,
            rx,
        }))
    }

    async fn join(&self, mut rx: watch::Receiver<Flight>) -> Result<String, RefreshError> {
        let started = Instant::now();
        let settled = tokio::time::timeout(
            self.wait_timeout,
            rx.wait_for(|flight| *flight != Flight::Pending),
        )
        .await;

        match settled {
            Err(_) => {
                let waited_ms = millis(started.elapsed());
                tracing::warn!(waited_ms, "Gave up waiting for token refresh");
                Err(RefreshError::WaitTimedOut { waited_ms })
            }
            Ok(Ok(flight)) => match &*flight {
                Flight::Refreshed(token) => Ok(token.clone()),
                Flight::Pending | Flight::Failed => Err(RefreshError::InFlightFailed),
            },
            Ok(Err(_)) => Err(RefreshError::InFlightFailed),
        }
    }

    async fn perform(&self) -> Result<String, RefreshError> {
        let Some(refresh_token) = self.credentials.refresh_token() else {
            tracing::error!("No refresh token available");
            self.end_session();
            return Err(RefreshError::MissingRefreshToken);
        };

        tracing::info!(
            refresh_token = %token_preview(&refresh_token),
            "Attempting to refresh token"
        );

        let mut request = ApiRequest::post(self.refresh_path.as_str(), json!({}));
        request.set_bearer(&refresh_token);
        let prepared = request
            .prepare(&self.base_url, self.request_timeout)
            .map_err(RefreshError::InvalidRequest)?;

        let response = match self.transport.send(&prepared).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Token refresh failed");
                return Err(e.into());
            }
        };

        if response.status.is_auth_rejection() {
            tracing::error!(status = %response.status, "Refresh token rejected");
            self.end_session();
            return Err(RefreshError::Rejected {
                status: response.status,
            });
        }
        if !response.is_success() {
            tracing::error!(status = %response.status, "Token refresh failed");
            return Err(RefreshError::Failed {
                status: response.status,
            });
        }

        let grant: TokenGrant = response
            .json()
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        let Some(access_token) = grant.access_token.clone().filter(|t| !t.is_empty()) else {
            tracing::error!("Refresh response missing access token");
            return Err(RefreshError::InvalidResponse(
                "missing access_token".to_string(),
            ));
        };

        if let Err(e) = self.credentials.store_grant(&TokenGrant {
            session_id: None,
            ..grant.clone()
        }) {
            tracing::warn!(error = %e, "Failed to persist refreshed token");
        }

        tracing::info!(
            access_token = %token_preview(&access_token),
            rotated = grant.refresh_token.is_some(),
            with_user = grant.user.is_some(),
            "Token refreshed successfully"
        );
        Ok(access_token)
    }

    fn end_session(&self) {
        self.credentials.clear_all();
        tracing::info!(route = %self.login_route, "Session ended, redirecting to login");
        self.navigator.navigate(&self.login_route);
    }

    fn cooldown_remaining(&self, last_attempt: Option<DateTime<Utc>>) -> Option<Duration> {
        let elapsed = elapsed_between(last_attempt?, self.clock.now());
        self.cooldown.checked_sub(elapsed).filter(|d| !d.is_zero())
    }
}

/// Time from `last` to `now`; a clock that moved backwards counts as no time.
fn elapsed_between(last: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - last).to_std().unwrap_or(Duration::ZERO)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
