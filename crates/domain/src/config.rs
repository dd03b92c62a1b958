//! Configuration structures
//!
//! Every field except `api.base_url` has a default, so a minimal config file
//! only needs:
//!
//! ```toml
//! [api]
//! base_url = "https://backoffice.example.com/api"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEYCHAIN_SERVICE, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_TTL_HOURS, DEFAULT_USER_AGENT,
    REFRESH_TOKEN_PATH,
};
use crate::impl_keyword_enum;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ClientConfig,
    #[serde(default)]
    pub credentials: CredentialStoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Configuration with defaults for everything but the API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api: ClientConfig::new(base_url),
            credentials: CredentialStoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every relative request path is joined onto
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Path of the token refresh endpoint, relative to `base_url`
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Lifetime given to a refreshed token in the credential store
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
    /// When set, the stored CSRF token is sent under this header on
    /// authenticated non-GET requests
    #[serde(default)]
    pub csrf_header: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            refresh_path: REFRESH_TOKEN_PATH.to_string(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            csrf_header: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(3600))
    }
}

/// Where session credentials are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// Process memory only; lost on exit
    #[default]
    Memory,
    /// JSON cookie-jar file
    File,
    /// Platform keychain
    Keychain,
}

impl_keyword_enum!(CredentialBackend {
    Memory => "memory",
    File => "file",
    Keychain => "keychain",
});

/// Credential store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStoreConfig {
    #[serde(default)]
    pub backend: CredentialBackend,
    /// Cookie-jar file, required by the `file` backend
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_keychain_service")]
    pub keychain_service: String,
}

impl Default for CredentialStoreConfig {
    fn default() -> Self {
        Self {
            backend: CredentialBackend::default(),
            path: None,
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

impl_keyword_enum!(LogFormat {
    Console => "console",
    Json => "json",
});

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. "info", "agrm_infra=debug");
    /// `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: LogFormat::default() }
    }
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_refresh_path() -> String {
    REFRESH_TOKEN_PATH.to_string()
}

const fn default_token_ttl_hours() -> u64 {
    DEFAULT_TOKEN_TTL_HOURS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_keychain_service() -> String {
    DEFAULT_KEYCHAIN_SERVICE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[api]
base_url = "https://backoffice.example.com/api"
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://backoffice.example.com/api");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.api.refresh_path, "/auth/refresh-token");
        assert_eq!(config.api.token_ttl(), Duration::from_secs(86_400));
        assert!(config.api.csrf_header.is_none());
        assert_eq!(config.credentials.backend, CredentialBackend::Memory);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Console);
    }

    #[test]
    fn huge_token_ttl_saturates() {
        let config = ClientConfig { token_ttl_hours: u64::MAX, ..ClientConfig::new("http://localhost") };
        assert_eq!(config.token_ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn json_sections_override_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "api": { "base_url": "http://localhost:8080", "timeout_secs": 5, "csrf_header": "X-XSRF-TOKEN" },
                "credentials": { "backend": "file", "path": "/tmp/agrm-cookies.json" },
                "logging": { "level": "debug", "format": "json" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.csrf_header.as_deref(), Some("X-XSRF-TOKEN"));
        assert_eq!(config.credentials.backend, CredentialBackend::File);
        assert_eq!(config.credentials.path, Some(PathBuf::from("/tmp/agrm-cookies.json")));
        assert_eq!(config.credentials.keychain_service, "AgrM.credentials");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let result: Result<Config, _> = toml::from_str("[logging]\nlevel = \"warn\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn backend_keywords() {
        assert_eq!("keychain".parse::<CredentialBackend>().unwrap(), CredentialBackend::Keychain);
        assert_eq!(CredentialBackend::File.to_string(), "file");
    }
}
