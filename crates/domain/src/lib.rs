//! Cogni Domain - Core client types
//!
//! This crate defines the domain model for the Cogni API client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod cookie;
pub mod error;
pub mod request;
pub mod response;
pub mod state;

pub use auth::{
    CredentialKey, ForgotPasswordRequest, LoginRequest, MessageResponse, PasswordReset,
    RegistrationField, RegistrationForm, ResendVerificationRequest, SocialProvider, TokenClaims,
    TokenGrant, User, ValidationErrors, token_preview,
};
pub use cookie::{Cookie, CookieJar, SameSite};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, Headers, HttpMethod, PreparedRequest};
pub use response::{ApiResponse, StatusCode};
pub use state::{RefreshState, SessionStatus};
