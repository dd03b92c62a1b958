//! In-memory credential store
//!
//! Keeps credentials for the lifetime of the process. Used by tests and by
//! short-lived tools that receive a token on the command line.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agrm_domain::{CredentialKey, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use super::ports::CredentialStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// Thread-safe in-memory [`CredentialStore`]
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    entries: Arc<Mutex<HashMap<CredentialKey, Entry>>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with an access token that never expires.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.insert(CredentialKey::AccessToken, token);
        store
    }

    /// Synchronously insert a non-expiring value.
    pub fn insert(&self, key: CredentialKey, value: impl Into<String>) {
        self.entries.lock().insert(key, Entry { value: value.into(), expires_at: None });
    }

    /// Synchronous read that honours expiry.
    #[must_use]
    pub fn peek(&self, key: CredentialKey) -> Option<String> {
        let now = Instant::now();
        self.entries.lock().get(&key).filter(|entry| entry.is_live(now)).map(|e| e.value.clone())
    }

    /// Whether a live value exists under `key`.
    #[must_use]
    pub fn contains(&self, key: CredentialKey) -> bool {
        self.peek(key).is_some()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(&key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: CredentialKey, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries.lock().insert(key, Entry { value: value.to_string(), expires_at });
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> Result<()> {
        self.entries.lock().remove(&key);
        Ok(())
    }
}
