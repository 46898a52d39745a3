//! Persistence: the key-value substrate, durable engine state, and the TOML
//! configuration file.

mod config;
pub mod database;
mod memory;
mod state;

pub use config::{AdviceConfig, Config, SoundConfig, StorageConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use state::{PersistedState, StateKey};

use std::path::PathBuf;

use crate::error::StorageError;

/// A string-keyed store of JSON values.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns `~/.config/pomowork[-dev]/` based on POMOWORK_ENV.
///
/// Set POMOWORK_ENV=dev to use the development data directory.
/// POMOWORK_HOME, when set, is used as the directory outright.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("POMOWORK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOWORK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomowork-dev")
            } else {
                base_dir.join("pomowork")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
