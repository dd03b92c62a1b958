//! Session credential management and token refresh
//!
//! ```text
//! ┌──────────────────────┐
//! │  RefreshCoordinator  │  single-flight refresh
//! └──────────┬───────────┘
//!            ├──► TokenRefresher      (refresh endpoint, infra)
//!            └──► SessionCredentials  (validated reads, purge)
//!                      │
//!                      └──► CredentialStore  (memory / file / keychain)
//! ```

pub mod errors;
pub mod memory;
pub mod ports;
pub mod refresh;
pub mod session;

pub use errors::{RefreshError, SessionError};
pub use memory::MemoryCredentialStore;
pub use ports::{CredentialStore, RefreshedSession, TokenRefresher};
pub use refresh::RefreshCoordinator;
pub use session::SessionCredentials;
