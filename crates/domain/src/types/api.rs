//! Request/response shapes shared by the API client and its consumers

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_CALL_TAG;
use crate::impl_keyword_enum;

/// How a successful response body is decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    #[default]
    Json,
    /// Raw bytes, for file downloads (PDF/CSV exports)
    Bytes,
}

impl_keyword_enum!(ResponseKind {
    Json => "json",
    Bytes => "bytes",
});

/// Decoded body of a successful response
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(Value),
    Bytes(Vec<u8>),
}

impl ApiBody {
    /// JSON value, if the body was decoded as JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Bytes(_) => None,
        }
    }

    /// Consume the body, keeping it only if it is JSON.
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Bytes(_) => None,
        }
    }

    /// Consume the body, keeping it only if it is raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Json(_) => None,
        }
    }
}

/// Normalized error shape handed to UI code: `{ message, status?, data? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None, data: None }
    }

    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Observable state of a tracked API call
///
/// `data` survives a failed call; `error` is cleared when the next call
/// starts.
#[derive(Debug, Clone, PartialEq)]
pub struct CallState {
    pub data: Option<ApiBody>,
    pub loading: bool,
    pub error: Option<ErrorPayload>,
    pub tag: String,
}

impl Default for CallState {
    fn default() -> Self {
        Self { data: None, loading: false, error: None, tag: DEFAULT_CALL_TAG.to_string() }
    }
}
