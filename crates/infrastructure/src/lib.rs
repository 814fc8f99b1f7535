//! Cogni Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading
//! and logging setup.

pub mod adapters;
pub mod config;
pub mod serialization;
pub mod store;
pub mod telemetry;

pub use adapters::{LoggingNavigator, ReqwestTransport, SystemClock};
pub use config::{ConfigError, load_config};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
pub use store::{FileCredentialStore, MemoryCredentialStore};
pub use telemetry::init_tracing;
