//! Observable call state
//!
//! [`CallTracker`] runs requests through an [`ApiClient`] and publishes
//! `{ data, loading, error, tag }` on a watch channel for UI consumers.
//! Only the most recently issued call may publish its outcome; a slower,
//! older call still returns its result to its caller.

use std::sync::atomic::{AtomicU64, Ordering};

use agrm_domain::{ApiBody, CallState};
use tokio::sync::watch;
use tracing::debug;

use super::client::ApiClient;
use super::errors::ApiError;
use super::request::ApiRequest;

/// Runs requests and publishes the latest issued call's [`CallState`]
pub struct CallTracker {
    client: ApiClient,
    state: watch::Sender<CallState>,
    generation: AtomicU64,
}

impl CallTracker {
    /// Tracker with an idle initial state.
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(CallState::default());
        Self { client, state, generation: AtomicU64::new(0) }
    }

    /// Receiver notified on every published state change.
    pub fn subscribe(&self) -> watch::Receiver<CallState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CallState {
        self.state.borrow().clone()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Execute `request`, publishing its progress and outcome.
    ///
    /// # Errors
    /// Returns the request's [`ApiError`]; the same error is published as an
    /// [`ErrorPayload`](agrm_domain::ErrorPayload).
    pub async fn run(&self, request: ApiRequest) -> Result<ApiBody, ApiError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tag = request.tag.clone();

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            state.tag = tag;
        });

        let result = self.client.execute(request).await;

        let published = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match &result {
                Ok(body) => {
                    state.data = Some(body.clone());
                    state.error = None;
                }
                Err(err) => state.error = Some(err.payload()),
            }
            state.loading = false;
            true
        });

        if !published {
            debug!(generation, "Superseded call finished; state left to the latest call");
        }
        result
    }
}
