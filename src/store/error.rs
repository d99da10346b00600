//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors raised by a storage backend.
///
/// A missing key is never an error: `Store::get` reports absence as `Ok(None)`.
#[derive(Debug, Error)]
pub enum StorageError {
    // ------------------------------------------------------------------------
    // Configuration (startup only)
    // ------------------------------------------------------------------------
    #[error("directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("error checking directory: {0}")]
    DirectoryCheck(#[source] std::io::Error),

    // ------------------------------------------------------------------------
    // Runtime faults
    // ------------------------------------------------------------------------
    /// I/O failure on a file inside the store directory.
    #[error("I/O error at {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key cannot be represented by the backend.
    #[error("{key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// Opaque backend failure, message passed through as is.
    #[error("{0}")]
    Backend(String),
}

impl StorageError {
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// True for errors that can only happen while opening a store.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound(_) | Self::NotADirectory(_) | Self::DirectoryCheck(_)
        )
    }
}
