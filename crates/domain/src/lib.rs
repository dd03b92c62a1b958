//! # AgrM Domain
//!
//! Domain types for the AgrM back-office API client.
//!
//! This crate contains:
//! - Credential types (access token shape, storage keys)
//! - Request/response model (`ApiBody`, `ErrorPayload`, `CallState`)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Wire-level constants
//!
//! ## Architecture
//! - No dependencies on other AgrM crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
