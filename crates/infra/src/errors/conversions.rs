//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use agrm_domain::AgrmError;
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AgrmError);

impl From<InfraError> for AgrmError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AgrmError> for InfraError {
    fn from(value: AgrmError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAgrmError {
    fn into_agrm(self) -> AgrmError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → AgrmError */
/* -------------------------------------------------------------------------- */

impl IntoAgrmError for KeyringError {
    fn into_agrm(self) -> AgrmError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => AgrmError::NotFound("keychain entry not found".into()),
            BadEncoding(_) => {
                AgrmError::Security("credential in keychain is not valid UTF-8".into())
            }
            TooLong(name, limit) => AgrmError::Security(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                AgrmError::Security(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            PlatformFailure(err) => AgrmError::Storage(format!("keychain platform error: {err}")),
            NoStorageAccess(err) => {
                AgrmError::Storage(format!("unable to access secure storage: {err}"))
            }
            _ => AgrmError::Storage(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_agrm())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AgrmError */
/* -------------------------------------------------------------------------- */

impl IntoAgrmError for HttpError {
    fn into_agrm(self) -> AgrmError {
        if self.is_timeout() {
            return AgrmError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AgrmError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return AgrmError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => AgrmError::Auth(message),
                404 => AgrmError::NotFound(message),
                400..=499 => AgrmError::InvalidInput(message),
                _ => AgrmError::Network(message),
            };
        }

        AgrmError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_agrm())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → AgrmError */
/* -------------------------------------------------------------------------- */

impl IntoAgrmError for IoError {
    fn into_agrm(self) -> AgrmError {
        match self.kind() {
            ErrorKind::NotFound => AgrmError::NotFound(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                AgrmError::Security(format!("permission denied: {self}"))
            }
            _ => AgrmError::Storage(format!("I/O failure: {self}")),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_agrm())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → AgrmError */
/* -------------------------------------------------------------------------- */

impl IntoAgrmError for JsonError {
    fn into_agrm(self) -> AgrmError {
        if self.is_io() {
            AgrmError::Storage(format!("I/O failure while reading JSON: {self}"))
        } else {
            AgrmError::InvalidInput(format!("malformed JSON: {self}"))
        }
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_agrm())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
