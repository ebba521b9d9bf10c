//! Deterministic JSON for files Courier writes.
//!
//! Output uses 2-space indentation and a trailing newline. Object keys keep
//! the order the types declare them in, so re-saving an unchanged value gives
//! identical bytes.

mod json;

pub use json::*;
