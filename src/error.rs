//! Error types for the disk cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the disk cache.
///
/// A missing or expired entry is never an error; those come back as
/// `None`/`false` from the store operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty once trimmed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Filesystem fault while creating, writing, listing or removing
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Entry file exists but could not be read or decoded
    #[error("Retrieval error at {}: {reason}", path.display())]
    Retrieval { path: PathBuf, reason: String },

    /// Value could not be encoded for storage
    #[error("Encode error: {0}")]
    Encode(String),

    /// Configuration value rejected
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn retrieval(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CacheError::Retrieval {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the disk cache.
pub type Result<T> = std::result::Result<T, CacheError>;
