//! Core error types for pomowork-core.
//!
//! Failures that can reach the caller are split by concern (storage,
//! configuration, advice, validation) and folded into [`CoreError`].
//! User-facing refusals of engine actions are not errors of this kind; see
//! [`crate::engine::Rejection`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomowork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Advice provider errors
    #[error("Advice error: {0}")]
    Advice(#[from] AdviceError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Errors from the coaching advice capability.
///
/// The debouncer only logs these; the one-shot `advice` command reports them.
#[derive(Error, Debug)]
pub enum AdviceError {
    /// Task description too short to be worth a request
    #[error("Task description must be at least {min} characters")]
    TooShort { min: usize },

    /// Provider is not configured (missing API key, disabled)
    #[error("Advice provider not configured: {0}")]
    NotConfigured(String),

    /// Transport failure
    #[error("Advice request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Advice provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response did not contain the expected fields
    #[error("Malformed advice response: {0}")]
    Malformed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Unknown identifier
    #[error("No {kind} with id '{id}'")]
    UnknownId { kind: String, id: String },

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
