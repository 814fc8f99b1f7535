//! Outgoing request types

mod header;
mod method;
mod spec;

pub use header::{AUTHORIZATION, Header, Headers, SESSION_ID};
pub use method::HttpMethod;
pub use spec::{ApiRequest, PreparedRequest};
