//! # AgrM Core
//!
//! Session logic for the AgrM API client - no HTTP or platform code.
//!
//! This crate contains:
//! - Port interfaces (`CredentialStore`, `TokenRefresher`)
//! - Validated session credential access and purge
//! - Single-flight token refresh coordination
//! - An in-memory credential store
//!
//! ## Architecture Principles
//! - Only depends on `agrm-domain`
//! - All I/O via traits implemented in `agrm-infra`
//! - Pure, testable logic

pub mod auth;

pub use auth::{
    CredentialStore, MemoryCredentialStore, RefreshCoordinator, RefreshError, RefreshedSession,
    SessionCredentials, SessionError, TokenRefresher,
};
