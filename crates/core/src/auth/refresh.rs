//! Single-flight token refresh
//!
//! When several in-flight requests are rejected with the same expired
//! token, only the first one to enter the critical section talks to the
//! refresh endpoint. The others find a different token in the store and
//! reuse it.

use std::sync::Arc;

use agrm_domain::AccessToken;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::errors::RefreshError;
use super::ports::TokenRefresher;
use super::session::SessionCredentials;

/// Serializes token refreshes for every client sharing a session
pub struct RefreshCoordinator {
    session: SessionCredentials,
    refresher: Arc<dyn TokenRefresher>,
    gate: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(session: SessionCredentials, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self { session, refresher, gate: Mutex::new(()) }
    }

    /// Session the coordinator writes refreshed tokens into.
    #[must_use]
    pub const fn session(&self) -> &SessionCredentials {
        &self.session
    }

    /// Obtain a token to replace `rejected`.
    ///
    /// # Arguments
    /// * `rejected` - Token the server just answered 401 for, or `None` if
    ///   the request went out without one
    ///
    /// # Returns
    /// The stored token if another caller already replaced `rejected`,
    /// otherwise a freshly refreshed token that has been persisted.
    ///
    /// # Errors
    /// Returns `RefreshError::NoToken` when nothing is stored, the
    /// refresher's error when the exchange fails, and
    /// `RefreshError::Session` when the store cannot be read or written.
    #[instrument(skip_all, fields(rejected = ?rejected.map(AccessToken::preview)))]
    pub async fn refresh_after_rejection(
        &self,
        rejected: Option<&AccessToken>,
    ) -> Result<AccessToken, RefreshError> {
        let _guard = self.gate.lock().await;

        let current = self.session.access_token().await?.ok_or(RefreshError::NoToken)?;

        if rejected.is_some_and(|rejected| rejected != &current) {
            debug!("Token already refreshed by a concurrent request");
            return Ok(current);
        }

        let refreshed = match self.refresher.refresh(&current).await {
            Ok(refreshed) => refreshed,
            Err(err) => {
                warn!(error = %err, "Token refresh failed");
                return Err(err);
            }
        };

        self.session.replace_access_token(&refreshed.token).await?;
        if let Some(app_user) = refreshed.app_user.as_deref() {
            self.session.store_app_user(app_user).await?;
        }

        info!(token = %refreshed.token.preview(), "Access token refreshed");
        Ok(refreshed.token)
    }
}
