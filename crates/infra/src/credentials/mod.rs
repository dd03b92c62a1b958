//! Credential store backends
//!
//! - [`MemoryCredentialStore`]: process memory (re-exported from core)
//! - [`FileCredentialStore`]: JSON cookie-jar file
//! - [`KeychainCredentialStore`]: platform keychain
//!
//! File and keychain backends persist each value as a [`StoredEntry`] so
//! expiry survives restarts.

pub mod file;
pub mod keychain;

use std::sync::Arc;

use agrm_core::auth::CredentialStore;
pub use agrm_core::auth::MemoryCredentialStore;
use agrm_domain::{AgrmError, CredentialBackend, CredentialStoreConfig, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use file::FileCredentialStore;
pub use keychain::KeychainCredentialStore;

/// Persisted credential value with its expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    /// `None` means the value never expires
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    /// Entry expiring `ttl` from now, or never when `ttl` is `None`.
    pub fn new(value: &str, ttl: Option<std::time::Duration>) -> Self {
        let expires_at = ttl
            .and_then(|ttl| ChronoDuration::from_std(ttl).ok())
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        Self { value: value.to_string(), expires_at }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Open the credential store selected by `config`.
///
/// # Errors
/// Returns `AgrmError::Config` when the file backend has no path.
pub fn open_store(config: &CredentialStoreConfig) -> Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match config.backend {
        CredentialBackend::Memory => Arc::new(MemoryCredentialStore::new()),
        CredentialBackend::File => {
            let path = config.path.clone().ok_or_else(|| {
                AgrmError::Config("credentials.path is required for the file backend".into())
            })?;
            Arc::new(FileCredentialStore::new(path))
        }
        CredentialBackend::Keychain => {
            Arc::new(KeychainCredentialStore::new(config.keychain_service.clone()))
        }
    };

    info!(backend = %config.backend, "Credential store opened");
    Ok(store)
}
