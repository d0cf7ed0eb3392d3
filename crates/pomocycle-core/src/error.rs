//! Core error types for pomocycle-core.
//!
//! Every fallible operation in the library reports one of these through
//! thiserror, so callers can tell a bad configuration apart from a failed
//! write to the session store.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomocycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session store errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Session store errors.
///
/// Cloneable so a failed append can travel inside an [`Event`](crate::Event)
/// to every subscriber.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Failed to open the store
    #[error("Failed to open session store at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// Insert did not reach the medium
    #[error("Failed to append session record: {0}")]
    WriteFailed(String),

    /// Read-back failed
    #[error("Failed to read session records: {0}")]
    ReadFailed(String),

    /// Migration failed
    #[error("Session store migration failed: {0}")]
    MigrationFailed(String),

    /// Store is locked by another writer
    #[error("Session store is locked")]
    Locked,

    /// A stored or imported row could not be decoded
    #[error("Malformed session record at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not resolve or create the data directory
    #[error("Failed to prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A duration or cycle length was zero
    #[error("Invalid value for '{field}': must be a positive integer")]
    NonPositive { field: &'static str },

    /// Averages need at least one date
    #[error("Empty date range")]
    EmptyRange,
}

impl PersistenceError {
    /// Classify a failed insert.
    pub(crate) fn from_write(err: rusqlite::Error) -> Self {
        if is_locked(&err) {
            PersistenceError::Locked
        } else {
            PersistenceError::WriteFailed(err.to_string())
        }
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        if is_locked(&err) {
            PersistenceError::Locked
        } else {
            PersistenceError::ReadFailed(err.to_string())
        }
    }
}

fn is_locked(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::DatabaseLocked
                || e.code == rusqlite::ErrorCode::DatabaseBusy
    )
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
