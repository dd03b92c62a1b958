//! Port interfaces for session credentials
//!
//! These traits define the boundaries between the request/refresh logic
//! and the infrastructure that persists credentials or talks to the
//! refresh endpoint.

use std::time::Duration;

use agrm_domain::{AccessToken, CredentialKey, Result};
use async_trait::async_trait;

use super::errors::RefreshError;

/// Trait for persisting session credentials
///
/// Implementations must treat expired entries as absent and must make
/// `remove` idempotent.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Get the value stored under `key`, if present and not expired
    async fn get(&self, key: CredentialKey) -> Result<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl` when given
    async fn set(&self, key: CredentialKey, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Remove the value stored under `key`
    async fn remove(&self, key: CredentialKey) -> Result<()>;

    /// Remove every session credential (token, app user, CSRF token)
    async fn purge(&self) -> Result<()> {
        for key in CredentialKey::ALL {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Outcome of a successful token refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedSession {
    pub token: AccessToken,
    /// Serialized user record, when the refresh endpoint returns one
    pub app_user: Option<String>,
}

/// Trait for exchanging a (possibly expired) access token for a new one
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `current` for a fresh session
    async fn refresh(
        &self,
        current: &AccessToken,
    ) -> std::result::Result<RefreshedSession, RefreshError>;
}
