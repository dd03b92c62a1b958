//! Credential types
//!
//! Access tokens are opaque to the client apart from their shape: three
//! non-empty, dot-separated segments (header.payload.signature).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    ACCESS_TOKEN_KEY, APP_USER_KEY, CSRF_TOKEN_KEY, TOKEN_PREVIEW_CHARS,
};

/// Reasons a stored token is rejected before any request is sent
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFormatError {
    #[error("token is empty")]
    Empty,

    #[error("token is a serialized placeholder (\"undefined\" or \"null\")")]
    Placeholder,

    #[error("token has {0} segments, expected 3")]
    SegmentCount(usize),

    #[error("token has an empty segment")]
    EmptySegment,

    #[error("token contains characters outside visible ASCII")]
    InvalidCharacter,
}

/// A bearer access token with a validated three-segment shape
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessToken(String);

impl AccessToken {
    /// Validate and wrap a raw token string.
    ///
    /// # Errors
    /// Returns [`TokenFormatError`] when the value is blank, a placeholder
    /// left behind by a front-end (`"undefined"`, `"null"`), not made of
    /// exactly three non-empty dot-separated segments, or contains bytes that
    /// cannot appear in an `Authorization` header.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TokenFormatError> {
        let raw = raw.into();

        if raw.trim().is_empty() {
            return Err(TokenFormatError::Empty);
        }
        if raw == "undefined" || raw == "null" {
            return Err(TokenFormatError::Placeholder);
        }

        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenFormatError::SegmentCount(segments.len()));
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(TokenFormatError::EmptySegment);
        }
        if !raw.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(TokenFormatError::InvalidCharacter);
        }

        Ok(Self(raw))
    }

    /// Raw token value, for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Truncated form that is safe to put in log lines.
    #[must_use]
    pub fn preview(&self) -> String {
        let head: String = self.0.chars().take(TOKEN_PREVIEW_CHARS).collect();
        format!("{head}...")
    }

    /// `Bearer <token>` header value.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"<redacted>").finish()
    }
}

impl TryFrom<String> for AccessToken {
    type Error = TokenFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AccessToken> for String {
    fn from(token: AccessToken) -> Self {
        token.0
    }
}

/// Keys under which session credentials are persisted
///
/// The names match the cookies the web front-end uses, so a cookie-jar file
/// exported from a browser session can be read as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKey {
    #[serde(rename = "token")]
    AccessToken,
    #[serde(rename = "XSRF-TOKEN")]
    CsrfToken,
    #[serde(rename = "appUser")]
    AppUser,
}

impl CredentialKey {
    /// Every key removed by a credential purge.
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::AppUser, Self::CsrfToken];

    /// Storage name of the key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => ACCESS_TOKEN_KEY,
            Self::CsrfToken => CSRF_TOKEN_KEY,
            Self::AppUser => APP_USER_KEY,
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_three_segment_tokens() {
        let token = AccessToken::parse("abc.def.ghi").unwrap();
        assert_eq!(token.as_str(), "abc.def.ghi");
        assert_eq!(token.bearer(), "Bearer abc.def.ghi");
    }

    #[test]
    fn rejects_blank_and_placeholder_values() {
        assert_eq!(AccessToken::parse(""), Err(TokenFormatError::Empty));
        assert_eq!(AccessToken::parse("   "), Err(TokenFormatError::Empty));
        assert_eq!(AccessToken::parse("undefined"), Err(TokenFormatError::Placeholder));
        assert_eq!(AccessToken::parse("null"), Err(TokenFormatError::Placeholder));
    }

    #[test]
    fn rejects_wrong_segment_counts() {
        assert_eq!(AccessToken::parse("abc"), Err(TokenFormatError::SegmentCount(1)));
        assert_eq!(AccessToken::parse("abc.def"), Err(TokenFormatError::SegmentCount(2)));
        assert_eq!(AccessToken::parse("a.b.c.d"), Err(TokenFormatError::SegmentCount(4)));
    }

    #[test]
    fn rejects_empty_segments() {
        assert_eq!(AccessToken::parse("abc..ghi"), Err(TokenFormatError::EmptySegment));
        assert_eq!(AccessToken::parse(".def.ghi"), Err(TokenFormatError::EmptySegment));
        assert_eq!(AccessToken::parse("abc.def."), Err(TokenFormatError::EmptySegment));
    }

    #[test]
    fn rejects_characters_invalid_in_headers() {
        assert_eq!(AccessToken::parse("abc.def.gh\u{1}i"), Err(TokenFormatError::InvalidCharacter));
        assert_eq!(AccessToken::parse("abc.de f.ghi"), Err(TokenFormatError::InvalidCharacter));
        assert_eq!(AccessToken::parse("abc.déf.ghi"), Err(TokenFormatError::InvalidCharacter));
        assert!(AccessToken::parse("eyJh-_bG.ci0i~J+/.Iz=").is_ok());
    }

    #[test]
    fn debug_output_is_redacted() {
        let token = AccessToken::parse("secret.payload.signature").unwrap();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn preview_truncates_long_tokens() {
        let token = AccessToken::parse("aaaaaaaaaa.bbbbbbbbbb.cccccccccc").unwrap();
        assert_eq!(token.preview(), "aaaaaaaaaa.bbbbbbbbb...");
    }

    #[test]
    fn serde_round_trip_validates() {
        let token: AccessToken = serde_json::from_str("\"a.b.c\"").unwrap();
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"a.b.c\"");
        assert!(serde_json::from_str::<AccessToken>("\"not-a-token\"").is_err());
    }

    #[test]
    fn credential_keys_match_cookie_names() {
        assert_eq!(CredentialKey::AccessToken.as_str(), "token");
        assert_eq!(CredentialKey::CsrfToken.as_str(), "XSRF-TOKEN");
        assert_eq!(CredentialKey::AppUser.as_str(), "appUser");
        assert_eq!(CredentialKey::ALL.len(), 3);
    }
}
