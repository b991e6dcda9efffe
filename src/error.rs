//! Error types for blockfs
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using FsError
pub type Result<T> = std::result::Result<T, FsError>;

/// Unified error type for blockfs operations
#[derive(Debug, Error)]
pub enum FsError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    InvalidArgument(String),

    #[error("file {0} already exists")]
    AlreadyExists(String),

    #[error("file {0} does not exist")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    #[error("maximum file count reached ({max_files} files)")]
    CapacityExceeded { max_files: usize },

    #[error("not enough free blocks: need {needed}, {available} available")]
    InsufficientSpace { needed: usize, available: usize },

    // -------------------------------------------------------------------------
    // Backing Store Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// In-memory metadata could not be re-synchronized with the store.
    /// Reads and mutations fail until a `reload()` succeeds.
    #[error("file system unavailable: metadata out of sync with backing store")]
    Unavailable,

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for FsError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) => FsError::Io(io),
            other => FsError::Serialization(other.to_string()),
        }
    }
}
