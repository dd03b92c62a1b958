//! Authenticated API client for the AgrM back-office REST API
//!
//! # Architecture
//!
//! - [`ApiClient`] attaches the stored bearer token, rejects malformed
//!   tokens before anything is sent, and recovers from a 401 with one token
//!   refresh and one retry
//! - [`HttpTokenRefresher`] talks to the refresh endpoint; refreshes are
//!   serialized by `agrm_core::auth::RefreshCoordinator`
//! - [`CallTracker`] exposes `{ data, loading, error, tag }` for UI code
//! - [`Resource`] gives typed CRUD access to one collection

pub mod auth;
pub mod client;
pub mod errors;
pub mod request;
pub mod resources;
pub mod tracker;

pub use auth::HttpTokenRefresher;
pub use client::{ApiClient, ApiClientBuilder};
pub use errors::{ApiError, ApiErrorCategory};
pub use request::ApiRequest;
pub use resources::Resource;
pub use tracker::CallTracker;
