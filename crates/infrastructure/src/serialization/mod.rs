//! Deterministic JSON for files written by the client.
//!
//! Object keys come out in `BTreeMap` order with 2-space indentation and a
//! trailing newline, so a cookie file reads the same after every write.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
