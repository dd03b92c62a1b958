//! API-specific error types
//!
//! Every failure of [`ApiClient`](super::ApiClient) normalizes to an
//! [`ErrorPayload`] through [`ApiError::payload`].

use agrm_core::auth::{RefreshError, SessionError};
use agrm_domain::constants::{MSG_INVALID_TOKEN, MSG_SESSION_EXPIRED};
use agrm_domain::{AgrmError, ErrorPayload};
use serde_json::Value;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Missing, malformed or rejected credentials
    Authentication,
    /// 4xx other than 401
    Client,
    /// 5xx
    Server,
    /// Connection failure or timeout
    Network,
    /// Invalid URL or client construction
    Config,
    /// Credential store failure
    Storage,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The stored access token is not a three-segment token. Nothing was sent.
    #[error("{}", MSG_INVALID_TOKEN)]
    InvalidCredentialFormat,

    /// 401 that a token refresh could not recover from.
    #[error("{message}")]
    Unauthorized { message: String },

    /// Any other non-2xx response.
    #[error("{message} (HTTP {status})")]
    RequestFailed { message: String, status: u16, data: Value },

    #[error("Network error: {0}")]
    Network(String),

    /// A successful response whose body could not be decoded.
    #[error("Failed to decode response (HTTP {status}): {message}")]
    Decode { message: String, status: u16 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl ApiError {
    pub(crate) fn session_expired() -> Self {
        Self::Unauthorized { message: MSG_SESSION_EXPIRED.to_string() }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::InvalidCredentialFormat | Self::Unauthorized { .. } => {
                ApiErrorCategory::Authentication
            }
            Self::RequestFailed { status, .. } if *status >= 500 => ApiErrorCategory::Server,
            Self::RequestFailed { .. } | Self::Decode { .. } => ApiErrorCategory::Client,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
            Self::Storage(_) => ApiErrorCategory::Storage,
        }
    }

    /// HTTP status associated with the error; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidCredentialFormat | Self::Unauthorized { .. } => 401,
            Self::RequestFailed { status, .. } | Self::Decode { status, .. } => *status,
            Self::Network(_) | Self::Config(_) | Self::Storage(_) => 0,
        }
    }

    /// Whether the credential store was purged because of this error.
    pub fn purges_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentialFormat | Self::Unauthorized { .. })
    }

    /// Normalized `{ message, status, data }` shape for UI consumers.
    pub fn payload(&self) -> ErrorPayload {
        match self {
            Self::InvalidCredentialFormat => {
                ErrorPayload::new(MSG_INVALID_TOKEN).with_status(self.status())
            }
            Self::Unauthorized { message } => {
                ErrorPayload::new(message.clone()).with_status(self.status())
            }
            Self::RequestFailed { message, status, data } => {
                ErrorPayload::new(message.clone()).with_status(*status).with_data(data.clone())
            }
            Self::Decode { message, status } => {
                ErrorPayload::new(message.clone()).with_status(*status)
            }
            Self::Network(message) | Self::Config(message) | Self::Storage(message) => {
                ErrorPayload::new(message.clone()).with_status(self.status())
            }
        }
    }
}

impl From<AgrmError> for ApiError {
    fn from(err: AgrmError) -> Self {
        match err {
            AgrmError::Network(msg) => Self::Network(msg),
            AgrmError::Config(msg) => Self::Config(msg),
            AgrmError::Storage(msg) | AgrmError::Security(msg) | AgrmError::NotFound(msg) => {
                Self::Storage(msg)
            }
            AgrmError::Auth(msg) => Self::Unauthorized { message: msg },
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidToken(_) => Self::InvalidCredentialFormat,
            SessionError::Storage(inner) => Self::Storage(inner.to_string()),
        }
    }
}

impl From<RefreshError> for ApiError {
    /// Refresh failures are terminal for the request: the session has expired.
    /// Store failures keep their own category.
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Session(SessionError::Storage(inner)) => Self::Storage(inner.to_string()),
            _ => Self::session_expired(),
        }
    }
}
