//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file from the working directory, if any
//! 2. Attempts to load from environment variables
//! 3. If `AGRM_API_BASE_URL` is missing, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `AGRM_API_BASE_URL`: Base URL of the REST API (required)
//! - `AGRM_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `AGRM_API_REFRESH_PATH`: Path of the token refresh endpoint
//! - `AGRM_API_TOKEN_TTL_HOURS`: Lifetime of a refreshed token
//! - `AGRM_API_CSRF_HEADER`: Header carrying the CSRF token on non-GET
//!   requests; `true`/`1`/`yes`/`on` selects `X-XSRF-TOKEN`, `false`/`0`/
//!   `no`/`off` disables it
//! - `AGRM_CREDENTIAL_BACKEND`: `memory`, `file` or `keychain`
//! - `AGRM_CREDENTIAL_PATH`: Cookie-jar file for the `file` backend
//! - `AGRM_KEYCHAIN_SERVICE`: Keychain service name
//! - `AGRM_LOG_LEVEL`: Default log filter
//! - `AGRM_LOG_FORMAT`: `console` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./agrm.json` or `./agrm.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use agrm_domain::constants::CSRF_HEADER_NAME;
use agrm_domain::{AgrmError, Config, CredentialBackend, LogFormat, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `AgrmError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "Ignoring unreadable .env file"),
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `AGRM_API_BASE_URL` is required; every other setting keeps its
/// default when unset.
///
/// # Errors
/// Returns `AgrmError::Config` if the base URL is missing or a variable has
/// an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::new(env_var("AGRM_API_BASE_URL")?);

    if let Some(timeout) = env_parse::<u64>("AGRM_API_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }
    if let Some(path) = env_opt("AGRM_API_REFRESH_PATH") {
        config.api.refresh_path = path;
    }
    if let Some(ttl) = env_parse::<u64>("AGRM_API_TOKEN_TTL_HOURS")? {
        config.api.token_ttl_hours = ttl;
    }
    config.api.csrf_header = env_opt("AGRM_API_CSRF_HEADER").and_then(|value| {
        match parse_bool(&value) {
            Some(true) => Some(CSRF_HEADER_NAME.to_string()),
            Some(false) => None,
            None => Some(value),
        }
    });

    if let Some(backend) = env_parse::<CredentialBackend>("AGRM_CREDENTIAL_BACKEND")? {
        config.credentials.backend = backend;
    }
    if let Some(path) = env_opt("AGRM_CREDENTIAL_PATH") {
        config.credentials.path = Some(PathBuf::from(path));
    }
    if let Some(service) = env_opt("AGRM_KEYCHAIN_SERVICE") {
        config.credentials.keychain_service = service;
    }

    if let Some(level) = env_opt("AGRM_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = env_parse::<LogFormat>("AGRM_LOG_FORMAT")? {
        config.logging.format = format;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `AgrmError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AgrmError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AgrmError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AgrmError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `AgrmError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AgrmError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AgrmError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(AgrmError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`, `./agrm.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("agrm.json"),
        dir.join("agrm.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `AgrmError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        AgrmError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; blank values count as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse an optional environment variable with `FromStr`.
///
/// # Errors
/// Returns `AgrmError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AgrmError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Parse a boolean flag
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 10] = [
        "AGRM_API_BASE_URL",
        "AGRM_API_TIMEOUT_SECS",
        "AGRM_API_REFRESH_PATH",
        "AGRM_API_TOKEN_TTL_HOURS",
        "AGRM_API_CSRF_HEADER",
        "AGRM_CREDENTIAL_BACKEND",
        "AGRM_CREDENTIAL_PATH",
        "AGRM_KEYCHAIN_SERVICE",
        "AGRM_LOG_LEVEL",
        "AGRM_LOG_FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_bool() {
        for value in ["1", "true", "YES", "On"] {
            assert_eq!(parse_bool(value), Some(true), "{value}");
        }
        for value in ["0", "false", "No", "OFF"] {
            assert_eq!(parse_bool(value), Some(false), "{value}");
        }
        assert_eq!(parse_bool("X-CSRF"), None);
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("AGRM_API_BASE_URL", "https://backoffice.example.com/api");
        std::env::set_var("AGRM_API_TIMEOUT_SECS", "10");
        std::env::set_var("AGRM_API_REFRESH_PATH", "/auth/refresh");
        std::env::set_var("AGRM_API_TOKEN_TTL_HOURS", "12");
        std::env::set_var("AGRM_API_CSRF_HEADER", "true");
        std::env::set_var("AGRM_CREDENTIAL_BACKEND", "file");
        std::env::set_var("AGRM_CREDENTIAL_PATH", "/tmp/agrm-cookies.json");
        std::env::set_var("AGRM_KEYCHAIN_SERVICE", "AgrM.test");
        std::env::set_var("AGRM_LOG_LEVEL", "debug");
        std::env::set_var("AGRM_LOG_FORMAT", "json");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.api.base_url, "https://backoffice.example.com/api");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.api.refresh_path, "/auth/refresh");
        assert_eq!(config.api.token_ttl_hours, 12);
        assert_eq!(config.api.csrf_header.as_deref(), Some("X-XSRF-TOKEN"));
        assert_eq!(config.credentials.backend, CredentialBackend::File);
        assert_eq!(config.credentials.path, Some(PathBuf::from("/tmp/agrm-cookies.json")));
        assert_eq!(config.credentials.keychain_service, "AgrM.test");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("AGRM_API_BASE_URL", "http://localhost:8080");
        std::env::set_var("AGRM_API_CSRF_HEADER", "X-CSRF-TOKEN");
        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.refresh_path, "/auth/refresh-token");
        assert_eq!(config.api.csrf_header.as_deref(), Some("X-CSRF-TOKEN"));
        assert_eq!(config.credentials.backend, CredentialBackend::Memory);
    }

    #[test]
    fn test_load_from_env_missing_base_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let result = load_from_env();
        assert!(matches!(result, Err(AgrmError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("AGRM_API_BASE_URL", "http://localhost:8080");
        std::env::set_var("AGRM_API_TIMEOUT_SECS", "soon");
        let bad_timeout = load_from_env();

        std::env::set_var("AGRM_API_TIMEOUT_SECS", "5");
        std::env::set_var("AGRM_CREDENTIAL_BACKEND", "floppy");
        let bad_backend = load_from_env();
        clear_env();

        assert!(matches!(bad_timeout, Err(AgrmError::Config(_))));
        match bad_backend {
            Err(AgrmError::Config(msg)) => assert!(msg.contains("AGRM_CREDENTIAL_BACKEND")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "api": { "base_url": "https://backoffice.example.com/api", "timeout_secs": 15 },
            "credentials": { "backend": "keychain" }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = result.expect("config from JSON file");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.credentials.backend, CredentialBackend::Keychain);
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[api]
base_url = "http://localhost:8080"
token_ttl_hours = 8

[logging]
format = "json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(&path).ok();

        let config = result.expect("config from TOML file");
        assert_eq!(config.api.token_ttl_hours, 8);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(AgrmError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_parse_config_invalid_and_unsupported() {
        let invalid = parse_config(r#"{ "api": "#, &PathBuf::from("config.json"));
        assert!(matches!(invalid, Err(AgrmError::Config(_))));

        let unsupported = parse_config("api: {}", &PathBuf::from("config.yaml"));
        match unsupported {
            Err(AgrmError::Config(msg)) => assert!(msg.contains("yaml")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_candidates_order() {
        let candidates = candidates_in(Path::new("/srv/agrm"));
        assert_eq!(candidates[0], PathBuf::from("/srv/agrm/config.json"));
        assert_eq!(candidates[2], PathBuf::from("/srv/agrm/agrm.json"));
        assert_eq!(candidates.len(), 8);
    }
}
