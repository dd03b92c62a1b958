//! Platform keychain credential store
//!
//! One keychain entry per credential key under a shared service name
//! (default `AgrM.credentials`). Each entry holds a JSON [`StoredEntry`].

use std::time::Duration;

use agrm_core::auth::CredentialStore;
use agrm_domain::{AgrmError, CredentialKey, Result};
use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use super::StoredEntry;
use crate::errors::InfraError;

/// [`CredentialStore`] backed by the OS keychain
pub struct KeychainCredentialStore {
    service_name: String,
}

impl KeychainCredentialStore {
    /// # Arguments
    /// * `service_name` - Keychain service identifier (e.g. "AgrM.credentials")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Run a blocking keychain operation off the async runtime.
    async fn with_entry<T, F>(&self, key: CredentialKey, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T> + Send + 'static,
    {
        let service = self.service_name.clone();
        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, key.as_str()).map_err(InfraError::from)?;
            op(entry)
        })
        .await
        .map_err(|err| AgrmError::Internal(format!("keychain task failed: {err}")))?
    }
}

/// Decode a keychain secret. Values written by other tools as a bare string
/// are accepted as non-expiring.
fn decode_secret(secret: &str) -> StoredEntry {
    match serde_json::from_str::<StoredEntry>(secret) {
        Ok(entry) => entry,
        Err(_) => StoredEntry { value: secret.to_string(), expires_at: None },
    }
}

#[async_trait]
impl CredentialStore for KeychainCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        debug!(service = %self.service_name, %key, "Reading credential from keychain");

        let secret = self
            .with_entry(key, |entry| match entry.get_password() {
                Ok(secret) => Ok(Some(secret)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(err) => Err(InfraError::from(err).into()),
            })
            .await?;

        Ok(secret.map(|s| decode_secret(&s)).filter(|entry| !entry.is_expired()).map(|e| e.value))
    }

    async fn set(&self, key: CredentialKey, value: &str, ttl: Option<Duration>) -> Result<()> {
        debug!(service = %self.service_name, %key, "Storing credential in keychain");

        let secret = serde_json::to_string(&StoredEntry::new(value, ttl))
            .map_err(InfraError::from)?;
        self.with_entry(key, move |entry| {
            entry.set_password(&secret).map_err(|err| InfraError::from(err).into())
        })
        .await
    }

    /// Idempotent: a missing entry is not an error.
    async fn remove(&self, key: CredentialKey) -> Result<()> {
        debug!(service = %self.service_name, %key, "Deleting credential from keychain");

        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => {
                warn!(error = %err, "Keychain deletion failed");
                Err(InfraError::from(err).into())
            }
        })
        .await
    }
}
