//! Configuration loading
//!
//! Loads the client configuration from environment variables (with `.env`
//! support) or from JSON/TOML files.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
