//! Token refresh over HTTP
//!
//! Exchanges the current access token for a new one by POSTing
//! `{"token": "<current>"}` to the refresh endpoint.

use agrm_core::auth::{RefreshError, RefreshedSession, TokenRefresher};
use agrm_domain::{AccessToken, ClientConfig};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

use super::client::resolve_url;
use super::errors::ApiError;
use crate::http::HttpClient;

/// [`TokenRefresher`] backed by the API's refresh endpoint
pub struct HttpTokenRefresher {
    http: HttpClient,
    refresh_url: Url,
}

impl HttpTokenRefresher {
    /// # Errors
    /// Returns `ApiError::Config` if `base_url` and `refresh_path` do not
    /// form a valid URL.
    pub fn new(http: HttpClient, config: &ClientConfig) -> Result<Self, ApiError> {
        let refresh_url = resolve_url(&config.base_url, &config.refresh_path)?;
        Ok(Self { http, refresh_url })
    }

    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    #[instrument(skip_all, fields(url = %self.refresh_url))]
    async fn refresh(&self, current: &AccessToken) -> Result<RefreshedSession, RefreshError> {
        let request = self
            .http
            .request(Method::POST, self.refresh_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&json!({ "token": current.as_str() }));

        let response = self
            .http
            .send(request)
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected(status.as_u16()));
        }

        let body: Value =
            response.json().await.map_err(|err| RefreshError::Transport(err.to_string()))?;

        let session = parse_refresh_body(&body)?;
        debug!(has_app_user = session.app_user.is_some(), "Refresh endpoint issued a new token");
        Ok(session)
    }
}

/// Extract the new token and optional user record from a refresh response.
fn parse_refresh_body(body: &Value) -> Result<RefreshedSession, RefreshError> {
    let raw = match body.get("token") {
        Some(Value::String(token)) if !token.is_empty() => token,
        _ => return Err(RefreshError::MissingToken),
    };
    let token = AccessToken::parse(raw.as_str()).map_err(RefreshError::InvalidToken)?;

    let app_user = match body.get("appUser") {
        None | Some(Value::Null) => None,
        Some(user) => Some(user.to_string()),
    };

    Ok(RefreshedSession { token, app_user })
}
