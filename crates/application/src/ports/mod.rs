//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod credential_store;
mod http_transport;
mod navigator;

pub use clock::Clock;
pub use credential_store::{CredentialStore, StoreError};
pub use http_transport::{HttpTransport, TransportError};
pub use navigator::Navigator;
