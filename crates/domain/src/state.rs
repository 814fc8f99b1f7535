//! Observable client states.
//!
//! `RefreshState` mirrors the refresh coordinator's state machine and
//! `SessionStatus` summarises the stored credentials for display.

use serde::{Deserialize, Serialize};

/// State of the token refresh coordinator.
///
/// - `Idle`: a refresh may start immediately
/// - `CoolingDown`: the last attempt was too recent; new attempts are refused
/// - `Refreshing`: a refresh call is in flight; callers join it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    /// No refresh in flight and no cooldown active.
    #[default]
    Idle,
    /// The previous attempt started less than one cooldown window ago.
    CoolingDown {
        /// Milliseconds until a new attempt is allowed.
        remaining_ms: u64,
    },
    /// A refresh call is in flight.
    Refreshing,
}

impl RefreshState {
    /// Returns true while a refresh call is in flight.
    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        matches!(self, Self::Refreshing)
    }

    /// Returns true when a new refresh would be refused.
    #[must_use]
    pub const fn is_cooling_down(&self) -> bool {
        matches!(self, Self::CoolingDown { .. })
    }
}

/// Status of the stored session credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// No access token and no refresh token.
    SignedOut,
    /// Access token present and not expired.
    Active {
        /// Subject claim of the access token.
        user_id: Option<String>,
        /// Seconds until expiry, or None if the token has no `exp`.
        seconds_remaining: Option<i64>,
        /// Whether a server session id is stored.
        has_session_id: bool,
    },
    /// Access token missing, expired or malformed.
    Expired {
        /// Whether a refresh token is available to recover.
        can_refresh: bool,
    },
}

impl SessionStatus {
    /// Returns true if requests would carry a usable access token.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::SignedOut => "Not signed in".to_string(),
            Self::Active {
                seconds_remaining: Some(secs),
                ..
            } => {
                if *secs > 3600 {
                    format!("Signed in, token valid for {} hours", secs / 3600)
                } else if *secs > 60 {
                    format!("Signed in, token valid for {} minutes", secs / 60)
                } else {
                    format!("Signed in, token valid for {secs} seconds")
                }
            }
            Self::Active {
                seconds_remaining: None,
                ..
            } => "Signed in (token has no expiry)".to_string(),
            Self::Expired { can_refresh: true } => "Token expired (can refresh)".to_string(),
            Self::Expired { can_refresh: false } => "Token expired".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn refresh_state_predicates() {
        assert!(RefreshState::Refreshing.is_refreshing());
        assert!(RefreshState::CoolingDown { remaining_ms: 10 }.is_cooling_down());
        assert_eq!(RefreshState::default(), RefreshState::Idle);
    }

    #[test]
    fn session_status_messages() {
        assert_eq!(SessionStatus::SignedOut.display_message(), "Not signed in");

        let active = SessionStatus::Active {
            user_id: Some("7".into()),
            seconds_remaining: Some(7200),
            has_session_id: true,
        };
        assert!(active.is_active());
        assert!(active.display_message().contains("2 hours"));

        assert!(
            SessionStatus::Expired { can_refresh: true }
                .display_message()
                .contains("can refresh")
        );
    }
}
