//! Authenticated API client
//!
//! Attaches the stored bearer token to every request, refuses to send a
//! malformed token, and recovers from a 401 with one token refresh and one
//! retry. Every failure is normalized into an [`ApiError`].

use std::sync::Arc;

use agrm_core::auth::{
    CredentialStore, MemoryCredentialStore, RefreshCoordinator, SessionCredentials, SessionError,
    TokenRefresher,
};
use agrm_domain::constants::{MSG_REQUEST_FAILED, MSG_UNAUTHORIZED};
use agrm_domain::{AccessToken, ApiBody, ClientConfig, Config, ResponseKind};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::auth::HttpTokenRefresher;
use super::errors::ApiError;
use super::request::ApiRequest;
use crate::credentials;
use crate::http::HttpClient;

/// API client bound to one base URL and one credential store
///
/// Clones share the HTTP connection pool, the credential store and the
/// refresh coordinator, so concurrent 401s across clones trigger a single
/// refresh.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    session: SessionCredentials,
    refresh: Arc<RefreshCoordinator>,
    csrf_header: Option<HeaderName>,
}

impl ApiClient {
    /// Create a client that reads credentials from `store`.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the HTTP client cannot be built or the
    /// configured URLs or CSRF header name are invalid.
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        Self::builder(config).credential_store(store).build()
    }

    /// Create a client and its credential store from a full configuration.
    ///
    /// # Errors
    /// Returns `ApiError::Config` for invalid client settings and
    /// `ApiError::Storage` when the configured credential backend cannot be
    /// opened.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let store = credentials::open_store(&config.credentials)?;
        Self::new(config.api.clone(), store)
    }

    /// Create a builder for fluent configuration
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Session credentials used by this client.
    pub fn session(&self) -> &SessionCredentials {
        &self.session
    }

    /// Base URL that `/`-prefixed request paths are joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Remove every stored credential.
    ///
    /// # Errors
    /// Returns `ApiError::Storage` if the store rejects the removal.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.session.purge().await?;
        Ok(())
    }

    /// Execute a request and return the decoded body.
    ///
    /// # Errors
    /// - `ApiError::InvalidCredentialFormat` if the stored token is
    ///   malformed; nothing is sent and credentials are purged
    /// - `ApiError::Unauthorized` if a 401 could not be recovered by a
    ///   refresh; credentials are purged
    /// - `ApiError::RequestFailed` for any other non-2xx response
    /// - `ApiError::Network`, `ApiError::Decode`, `ApiError::Config` or
    ///   `ApiError::Storage` for transport, decoding, URL or store failures
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiBody, ApiError> {
        self.execute_with_status(&request).await.map(|(_, body)| body)
    }

    #[instrument(
        name = "api_request",
        skip_all,
        fields(tag = %request.tag, method = %request.method, url = %request.url)
    )]
    async fn execute_with_status(
        &self,
        request: &ApiRequest,
    ) -> Result<(StatusCode, ApiBody), ApiError> {
        let url = resolve_url(&self.base_url, &request.url)?;
        let mut token = if request.skip_auth { None } else { self.stored_token().await? };
        let mut is_retry = false;

        loop {
            let response = self.dispatch(request, &url, token.as_ref()).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if request.skip_auth {
                    warn!("401 Unauthorized on unauthenticated request; not refreshing");
                    return Err(ApiError::Unauthorized { message: MSG_UNAUTHORIZED.to_string() });
                }
                if is_retry {
                    error!("401 Unauthorized after token refresh");
                    self.purge_credentials().await;
                    return Err(ApiError::Unauthorized { message: MSG_UNAUTHORIZED.to_string() });
                }

                warn!("401 Unauthorized, attempting token refresh");
                match self.refresh.refresh_after_rejection(token.as_ref()).await {
                    Ok(fresh) => {
                        info!("Retrying request with refreshed token");
                        token = Some(fresh);
                        is_retry = true;
                        continue;
                    }
                    Err(err) => {
                        error!(error = %err, "Token refresh failed");
                        self.purge_credentials().await;
                        return Err(err.into());
                    }
                }
            }

            if !status.is_success() {
                return Err(error_from_response(response).await);
            }

            let body = decode_success(response, request.response_kind).await?;
            debug!(%status, "Request succeeded");
            return Ok((status, body));
        }
    }

    /// Execute a GET request and deserialize the JSON response
    ///
    /// # Errors
    /// As [`execute`](Self::execute); `ApiError::Decode` if the body does
    /// not deserialize into `R`.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }

    /// Execute a POST request with a JSON body and deserialize the response
    ///
    /// # Errors
    /// As [`get_json`](Self::get_json); `ApiError::Config` if `body` cannot
    /// be serialized.
    pub async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.send_json(ApiRequest::post(path, to_payload(body)?)).await
    }

    /// Execute a PUT request with a JSON body and deserialize the response
    ///
    /// # Errors
    /// As [`post_json`](Self::post_json).
    pub async fn put_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.send_json(ApiRequest::put(path, to_payload(body)?)).await
    }

    /// Execute a PATCH request with a JSON body and deserialize the response
    ///
    /// # Errors
    /// As [`post_json`](Self::post_json).
    pub async fn patch_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.send_json(ApiRequest::patch(path, to_payload(body)?)).await
    }

    /// Execute a DELETE request and deserialize the response
    ///
    /// # Errors
    /// As [`get_json`](Self::get_json).
    pub async fn delete_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.send_json(ApiRequest::delete(path)).await
    }

    /// Download a file (PDF/CSV export) as raw bytes
    ///
    /// # Errors
    /// As [`execute`](Self::execute).
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let body = self.execute(ApiRequest::get(path).bytes()).await?;
        Ok(body.into_bytes().unwrap_or_default())
    }

    /// Run `request` as JSON and deserialize the body into `R`.
    ///
    /// An empty or 204 body deserializes from `null`.
    ///
    /// # Errors
    /// As [`execute`](Self::execute); `ApiError::Decode` (carrying the
    /// response status) if the body does not deserialize into `R`.
    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let request = request.response_kind(ResponseKind::Json);
        let (status, body) = self.execute_with_status(&request).await?;
        let value = body.into_json().unwrap_or(Value::Null);

        serde_json::from_value(value).map_err(|err| ApiError::Decode {
            message: format!("Failed to parse response: {err}"),
            status: status.as_u16(),
        })
    }

    /// Read the stored token, purging credentials if it is malformed.
    async fn stored_token(&self) -> Result<Option<AccessToken>, ApiError> {
        match self.session.access_token().await {
            Ok(Some(token)) => Ok(Some(token)),
            Ok(None) => {
                warn!("No access token stored; sending request without credentials");
                Ok(None)
            }
            Err(SessionError::InvalidToken(reason)) => {
                error!(%reason, "Stored access token is malformed; clearing credentials");
                self.purge_credentials().await;
                Err(ApiError::InvalidCredentialFormat)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        url: &Url,
        token: Option<&AccessToken>,
    ) -> Result<Response, ApiError> {
        let mut builder = self.http.request(request.method.clone(), url.clone());

        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        if let Some(token) = token {
            let value = HeaderValue::from_str(&token.bearer())
                .map_err(|_| ApiError::InvalidCredentialFormat)?;
            builder = builder.header(AUTHORIZATION, value);
        }

        if let Some((name, value)) = self.csrf_header_for(request).await? {
            builder = builder.header(name, value);
        }

        Ok(self.http.send(builder).await?)
    }

    /// CSRF header for authenticated state-changing requests, when enabled.
    async fn csrf_header_for(
        &self,
        request: &ApiRequest,
    ) -> Result<Option<(HeaderName, HeaderValue)>, ApiError> {
        let Some(name) = &self.csrf_header else {
            return Ok(None);
        };
        if request.skip_auth || request.method == Method::GET {
            return Ok(None);
        }

        let Some(csrf) = self.session.csrf_token().await? else {
            return Ok(None);
        };
        match HeaderValue::from_str(&csrf) {
            Ok(value) => Ok(Some((name.clone(), value))),
            Err(_) => {
                warn!("Stored CSRF token is not a valid header value; omitting it");
                Ok(None)
            }
        }
    }

    /// Best-effort purge; a failure is logged and never replaces the
    /// authentication error being reported.
    async fn purge_credentials(&self) {
        if let Err(err) = self.session.purge().await {
            error!(error = %err, "Failed to purge credentials");
        }
    }
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn CredentialStore>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    http: Option<HttpClient>,
}

impl ApiClientBuilder {
    /// Start from `config` with the default store, refresher and transport.
    pub fn new(config: ClientConfig) -> Self {
        Self { config, store: None, refresher: None, http: None }
    }

    /// Credential store; defaults to an empty in-memory store.
    #[must_use]
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Token refresher; defaults to [`HttpTokenRefresher`] on the
    /// configured refresh path.
    #[must_use]
    pub fn token_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Transport; defaults to an [`HttpClient`] built from the config's
    /// timeout and user agent.
    #[must_use]
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    /// Returns `ApiError::Config` if the HTTP client cannot be built, the
    /// base URL is not absolute or the CSRF header name is invalid.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config;
        Url::parse(&config.base_url).map_err(|err| {
            ApiError::Config(format!("Invalid base URL '{}': {err}", config.base_url))
        })?;

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder()
                .timeout(config.timeout())
                .user_agent(config.user_agent.clone())
                .build()?,
        };

        let refresher: Arc<dyn TokenRefresher> = match self.refresher {
            Some(refresher) => refresher,
            None => Arc::new(HttpTokenRefresher::new(http.clone(), &config)?),
        };

        let store = self.store.unwrap_or_else(|| Arc::new(MemoryCredentialStore::new()));
        let session = SessionCredentials::new(store, config.token_ttl());
        let refresh = Arc::new(RefreshCoordinator::new(session.clone(), refresher));

        let csrf_header = config
            .csrf_header
            .as_deref()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                    ApiError::Config(format!("Invalid CSRF header name '{name}': {err}"))
                })
            })
            .transpose()?;

        Ok(ApiClient { http, base_url: config.base_url, session, refresh, csrf_header })
    }
}

/// Resolve a request target: paths starting with `/` are appended to
/// `base_url`, anything else must be an absolute URL.
pub(crate) fn resolve_url(base_url: &str, target: &str) -> Result<Url, ApiError> {
    let joined;
    let candidate = if target.starts_with('/') {
        joined = format!("{}{}", base_url.trim_end_matches('/'), target);
        joined.as_str()
    } else {
        target
    };

    Url::parse(candidate).map_err(|err| ApiError::Config(format!("Invalid URL '{candidate}': {err}")))
}

fn to_payload<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|err| ApiError::Config(format!("Failed to serialize body: {err}")))
}

async fn decode_success(response: Response, kind: ResponseKind) -> Result<ApiBody, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|err| ApiError::Network(err.to_string()))?;

    match kind {
        ResponseKind::Bytes => Ok(ApiBody::Bytes(bytes.to_vec())),
        ResponseKind::Json => {
            // 204/205 carry no body by definition
            if status == StatusCode::NO_CONTENT
                || status == StatusCode::RESET_CONTENT
                || bytes.iter().all(u8::is_ascii_whitespace)
            {
                return Ok(ApiBody::Json(Value::Null));
            }
            serde_json::from_slice(&bytes).map(ApiBody::Json).map_err(|err| ApiError::Decode {
                message: format!("Failed to parse response: {err}"),
                status: status.as_u16(),
            })
        }
    }
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let data = match response.bytes().await {
        Ok(bytes) => decode_error_body(&bytes),
        Err(err) => {
            debug!(error = %err, "Failed to read error body");
            Value::Object(Map::new())
        }
    };
    let message = error_message(&data);
    warn!(status, message = %message, "Request failed");

    ApiError::RequestFailed { message, status, data }
}

/// Decode an error body: JSON when possible, otherwise non-empty text as a
/// JSON string, otherwise an empty object.
fn decode_error_body(bytes: &[u8]) -> Value {
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        return value;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.trim().is_empty() => Value::String(text.to_string()),
        _ => Value::Object(Map::new()),
    }
}

/// Message precedence: `message` field, `error` field, the body itself when
/// it is a string, then a generic message.
fn error_message(data: &Value) -> String {
    let field = |name: &str| data.get(name).and_then(Value::as_str).filter(|s| !s.is_empty());

    if let Some(message) = field("message") {
        return message.to_string();
    }
    if let Some(error) = field("error") {
        return error.to_string();
    }
    match data {
        Value::String(text) if !text.is_empty() => text.clone(),
        _ => MSG_REQUEST_FAILED.to_string(),
    }
}
