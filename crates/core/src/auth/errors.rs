//! Session and refresh errors

use agrm_domain::{AgrmError, TokenFormatError};
use thiserror::Error;

/// Errors raised while reading or writing session credentials
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The stored access token does not have a valid shape
    #[error("stored access token is malformed: {0}")]
    InvalidToken(#[from] TokenFormatError),

    #[error(transparent)]
    Storage(#[from] AgrmError),
}

/// Reasons a token refresh did not produce a usable token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// Nothing to refresh: no token is stored
    #[error("no access token available to refresh")]
    NoToken,

    /// The refresh endpoint answered with a non-success status
    #[error("refresh endpoint returned status {0}")]
    Rejected(u16),

    /// The refresh response carried no usable `token` field
    #[error("refresh response did not contain a token")]
    MissingToken,

    /// The refresh response carried a token with an invalid shape
    #[error("refresh response contained a malformed token: {0}")]
    InvalidToken(TokenFormatError),

    #[error("refresh request failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}
