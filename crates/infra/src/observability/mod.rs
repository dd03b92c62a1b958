//! Logging setup
//!
//! Structured `tracing` output for the client, in console or JSON format.

pub mod logging;

pub use logging::{build_filter, init_tracing};
