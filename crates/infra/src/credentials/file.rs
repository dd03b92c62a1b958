//! JSON cookie-jar credential store
//!
//! File layout:
//!
//! ```json
//! {
//!   "token": { "value": "h.p.s", "expires_at": "2030-01-01T00:00:00Z" },
//!   "XSRF-TOKEN": { "value": "…", "expires_at": null }
//! }
//! ```
//!
//! Writes go to a sibling temp file that is then renamed over the jar.
//! Keys this store does not know are preserved.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use agrm_core::auth::CredentialStore;
use agrm_domain::{AgrmError, CredentialKey, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::StoredEntry;
use crate::errors::InfraError;

type Jar = BTreeMap<String, StoredEntry>;

/// [`CredentialStore`] persisted to a JSON file
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_jar(&self) -> Result<Jar> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Jar::new()),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Jar::new());
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            AgrmError::Storage(format!(
                "credential file {} is corrupt: {err}",
                self.path.display()
            ))
        })
    }

    async fn write_jar(&self, jar: &Jar) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }

        let contents = serde_json::to_vec_pretty(jar).map_err(InfraError::from)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, contents).await.map_err(InfraError::from)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(InfraError::from)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read-modify-write under the write lock; the jar is only rewritten
    /// when `edit` reports a change.
    async fn update<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Jar) -> bool + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut jar = self.read_jar().await?;
        if edit(&mut jar) {
            self.write_jar(&jar).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        let jar = self.read_jar().await?;
        Ok(jar.get(key.as_str()).filter(|entry| !entry.is_expired()).map(|e| e.value.clone()))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: CredentialKey, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = StoredEntry::new(value, ttl);
        self.update(move |jar| {
            jar.insert(key.as_str().to_string(), entry);
            true
        })
        .await?;
        debug!("Credential written");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: CredentialKey) -> Result<()> {
        self.update(|jar| jar.remove(key.as_str()).is_some()).await
    }

    async fn purge(&self) -> Result<()> {
        self.update(|jar| {
            let before = jar.len();
            for key in CredentialKey::ALL {
                jar.remove(key.as_str());
            }
            jar.len() != before
        })
        .await
    }
}
