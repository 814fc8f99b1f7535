//! Cogni Application - Session handling and ports
//!
//! This crate contains the authenticated API client and the port
//! definitions (traits) that infrastructure adapters implement.
//! It depends only on the domain crate and defines interfaces for
//! external dependencies.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use auth::{
    Disposition, RefreshCoordinator, RequestDecorator, ResponseInterceptor, SessionCredentials,
    SessionService,
};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigValidationError, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult, RefreshError};
pub use ports::{Clock, CredentialStore, HttpTransport, Navigator, StoreError, TransportError};
