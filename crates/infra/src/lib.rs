//! # AgrM Infrastructure
//!
//! Infrastructure implementations of the core session ports.
//!
//! This crate contains:
//! - The authenticated API client (token injection, refresh and retry)
//! - HTTP transport (reqwest)
//! - Credential store backends (memory, cookie-jar file, OS keychain)
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `agrm-core`
//! - Depends on `agrm-domain` and `agrm-core`
//! - Contains all "impure" code (network, filesystem, keychain)

pub mod api;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClient, ApiError, ApiRequest, CallTracker, HttpTokenRefresher, Resource};
pub use credentials::{
    open_store, FileCredentialStore, KeychainCredentialStore, MemoryCredentialStore,
};
pub use errors::InfraError;
pub use http::HttpClient;
pub use observability::init_tracing;
