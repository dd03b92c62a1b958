//! Application constants
//!
//! Centralized location for the wire-level names and defaults shared by the
//! API client, the credential stores and the configuration loader.

// Credential storage keys (cookie names used by the web front-end)
pub const ACCESS_TOKEN_KEY: &str = "token";
pub const CSRF_TOKEN_KEY: &str = "XSRF-TOKEN";
pub const APP_USER_KEY: &str = "appUser";

// Refresh endpoint
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;

// HTTP defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("agrm-client/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_CALL_TAG: &str = "default";
pub const CSRF_HEADER_NAME: &str = "X-XSRF-TOKEN";

// Keychain service name used when none is configured
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "AgrM.credentials";

// User-facing error messages
pub const MSG_INVALID_TOKEN: &str = "Invalid authentication token. Please login again.";
pub const MSG_SESSION_EXPIRED: &str = "Session expired. Please login again.";
pub const MSG_UNAUTHORIZED: &str = "Unauthorized";
pub const MSG_REQUEST_FAILED: &str = "Request failed";

// Number of characters of a token that may appear in log lines
pub const TOKEN_PREVIEW_CHARS: usize = 20;
