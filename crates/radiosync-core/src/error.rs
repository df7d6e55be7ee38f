//! Error types for radiosync core operations.
//!
//! Errors are grouped by domain:
//! - [`FileSystemError`] for reads and writes against the data directory
//! - [`StoreError`] for the namespaced key-value store
//! - [`SyncError`] for the remote/cache synchronization steps
//!
//! The synchronization subsystem never returns [`SyncError`] to its caller.
//! Each failed step is logged, recorded in the
//! [`SyncOutcome`](crate::sync::SyncOutcome) and degrades the result instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in radiosync core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// Key-value store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A synchronization step failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns true if the error means the target does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FileSystem(FileSystemError::NotFound { .. }))
    }
}

/// File system errors.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// Path does not exist.
    #[error("Path not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Reading failed.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// Path being read.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Writing failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Path being written.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Directory creation failed.
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed {
        /// Directory path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Deletion failed.
    #[error("Failed to delete {path}: {reason}")]
    DeleteFailed {
        /// Path being deleted.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Rename failed.
    #[error("Failed to rename {from} to {to}: {reason}")]
    RenameFailed {
        /// Source path.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying reason.
        reason: String,
    },
}

/// Key-value store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing record could not be loaded.
    #[error("Failed to load store '{namespace}': {reason}")]
    LoadFailed {
        /// Store namespace.
        namespace: String,
        /// Underlying reason.
        reason: String,
    },

    /// The backing record could not be saved.
    #[error("Failed to save store '{namespace}': {reason}")]
    SaveFailed {
        /// Store namespace.
        namespace: String,
        /// Underlying reason.
        reason: String,
    },

    /// A stored value could not be interpreted as the requested type.
    #[error("Invalid value for '{namespace}.{key}': {value}")]
    InvalidValue {
        /// Store namespace.
        namespace: String,
        /// Key that holds the value.
        key: String,
        /// The raw stored value.
        value: String,
    },
}

/// Failures of the individual synchronization steps.
///
/// Every variant is recovered locally: read and fetch failures null out one
/// input of the decision, write failures are reported while the computed
/// result is still returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The cached config exists but could not be read or parsed.
    #[error("Cache read failed for {path}: {reason}")]
    CacheRead {
        /// Cache file path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The remote config could not be fetched (connection, timeout, status).
    #[error("Fetch from {url} failed: {reason}")]
    Fetch {
        /// Remote URL.
        url: String,
        /// Underlying reason.
        reason: String,
    },

    /// The remote body did not match the config shape.
    #[error("Remote config is malformed: {reason}")]
    Parse {
        /// Underlying reason.
        reason: String,
    },

    /// Persisting the chosen config failed.
    #[error("Cache write failed for {path}: {reason}")]
    CacheWrite {
        /// Cache file path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },
}

impl SyncError {
    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}
