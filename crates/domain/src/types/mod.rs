//! Domain types and models
//!
//! Credential shapes and the request/response model shared by the API
//! client, the credential stores and UI-facing call tracking.

pub mod api;
pub mod credentials;

pub use api::{ApiBody, CallState, ErrorPayload, ResponseKind};
pub use credentials::{AccessToken, CredentialKey, TokenFormatError};
