/// Extraction-specific errors
use thiserror::Error;

/// Result type alias using `ExtractError`
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Typed extraction failures
///
/// A failure here is recorded in the scan's error list and skipped; it never
/// aborts the enclosing scan.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// File does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Permission or I/O error while reading the file
    #[error("Unreadable file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Extension matched a supported format but container parsing failed
    #[error("Unsupported container {path}: {reason}")]
    UnsupportedContainer { path: String, reason: String },
}

impl From<ExtractError> for tonearm_core::CoreError {
    fn from(err: ExtractError) -> Self {
        tonearm_core::CoreError::metadata(err.to_string())
    }
}
