//! Error types for the indexer

use thiserror::Error;

/// Result type alias using `IndexError`
pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, Error)]
pub enum IndexError {
    /// Invalid configuration, surfaced synchronously to the caller of a
    /// mutating command (e.g. `add_directory` on a missing path)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A scan was requested while one is already running
    #[error("A scan is already in progress")]
    ScanInProgress,

    /// No configured root directory could be accessed at enumeration time
    #[error("No configured directory could be scanned")]
    NothingToScan,

    /// Filesystem watcher error
    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] tonearm_storage::StorageError),

    #[error("Extraction error: {0}")]
    Extract(#[from] tonearm_metadata::ExtractError),
}
