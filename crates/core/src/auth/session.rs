//! Validated access to the credentials of the current session

use std::sync::Arc;
use std::time::Duration;

use agrm_domain::{AccessToken, CredentialKey};
use tracing::{debug, info};

use super::errors::SessionError;
use super::ports::CredentialStore;

/// Session credentials on top of a [`CredentialStore`]
///
/// Reads the access token with shape validation, replaces it after a
/// refresh, and purges everything on unrecoverable auth failures.
#[derive(Clone)]
pub struct SessionCredentials {
    store: Arc<dyn CredentialStore>,
    token_ttl: Duration,
}

impl SessionCredentials {
    /// # Arguments
    /// * `store` - Backing credential store
    /// * `token_ttl` - Lifetime given to tokens written by a refresh
    pub fn new(store: Arc<dyn CredentialStore>, token_ttl: Duration) -> Self {
        Self { store, token_ttl }
    }

    /// Backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Current access token.
    ///
    /// # Returns
    /// `Ok(None)` when no token is stored.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidToken` when a token is stored but does
    /// not have a valid shape, and `SessionError::Storage` when the store
    /// cannot be read.
    pub async fn access_token(&self) -> Result<Option<AccessToken>, SessionError> {
        match self.store.get(CredentialKey::AccessToken).await? {
            Some(raw) => Ok(Some(AccessToken::parse(raw)?)),
            None => Ok(None),
        }
    }

    /// Replace the stored access token, applying the configured TTL.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if the store rejects the write.
    pub async fn replace_access_token(&self, token: &AccessToken) -> Result<(), SessionError> {
        self.store
            .set(CredentialKey::AccessToken, token.as_str(), Some(self.token_ttl))
            .await?;
        debug!(token = %token.preview(), "Access token replaced");
        Ok(())
    }

    /// Store the serialized user record returned by a refresh.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if the store rejects the write.
    pub async fn store_app_user(&self, app_user: &str) -> Result<(), SessionError> {
        self.store.set(CredentialKey::AppUser, app_user, Some(self.token_ttl)).await?;
        Ok(())
    }

    /// CSRF token set by the server, if any.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if the store cannot be read.
    pub async fn csrf_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.store.get(CredentialKey::CsrfToken).await?)
    }

    /// Remove token, app user and CSRF token.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if any removal fails.
    pub async fn purge(&self) -> Result<(), SessionError> {
        self.store.purge().await?;
        info!("Session credentials purged");
        Ok(())
    }

    /// Whether a well-formed access token is stored.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.access_token().await, Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use agrm_domain::TokenFormatError;

    use super::*;
    use crate::auth::memory::MemoryCredentialStore;

    fn session(store: &MemoryCredentialStore) -> SessionCredentials {
        SessionCredentials::new(Arc::new(store.clone()), Duration::from_secs(86_400))
    }

    #[tokio::test]
    async fn missing_token_is_not_an_error() {
        let store = MemoryCredentialStore::new();
        let session = session(&store);

        assert_eq!(session.access_token().await, Ok(None));
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn malformed_token_is_reported() {
        let store = MemoryCredentialStore::with_token("not-a-jwt");
        let session = session(&store);

        assert_eq!(
            session.access_token().await,
            Err(SessionError::InvalidToken(TokenFormatError::SegmentCount(1)))
        );
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn replace_then_read() {
        let store = MemoryCredentialStore::with_token("old.tok.en");
        let session = session(&store);

        let fresh = AccessToken::parse("new.tok.en").unwrap();
        session.replace_access_token(&fresh).await.unwrap();

        assert_eq!(session.access_token().await.unwrap(), Some(fresh));
        assert_eq!(store.peek(CredentialKey::AccessToken).as_deref(), Some("new.tok.en"));
    }

    #[tokio::test]
    async fn purge_removes_all_credentials() {
        let store = MemoryCredentialStore::with_token("abc.def.ghi");
        store.insert(CredentialKey::CsrfToken, "csrf");
        let session = session(&store);
        session.store_app_user("{\"login\":\"caissier\"}").await.unwrap();

        assert_eq!(session.csrf_token().await.unwrap().as_deref(), Some("csrf"));
        session.purge().await.unwrap();

        assert!(!store.contains(CredentialKey::AccessToken));
        assert!(!store.contains(CredentialKey::AppUser));
        assert!(!store.contains(CredentialKey::CsrfToken));
    }
}
