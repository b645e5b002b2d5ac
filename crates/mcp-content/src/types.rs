//! Core content types and the library error type.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default MIME type for content with no better guess.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// Contents of a file resource after it has been read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    /// Canonical path the content was read from.
    pub path: PathBuf,
    /// MIME type guessed from the file extension.
    pub mime_type: String,
    /// Size of the file in bytes.
    pub size: u64,
    pub body: FileBody,
}

/// File body. UTF-8 text is returned as-is, anything else base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum FileBody {
    Text(String),
    Blob(String),
}

impl FileBody {
    pub fn is_text(&self) -> bool {
        matches!(self, FileBody::Text(_))
    }
}

/// Errors that can occur in the content library.
#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Length must be positive")]
    LengthNotPositive,

    #[error("Requested length {requested} exceeds maximum allowed length {max}")]
    LengthTooLarge { requested: usize, max: usize },

    #[error("Random source failure: {0}")]
    Random(String),

    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied reading file: {0}")]
    PermissionDenied(String),

    #[error("Path is outside the resource root: {0}")]
    OutsideRoot(String),

    #[error("File too large: {size} bytes exceeds {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

impl ContentError {
    /// Whether the error was caused by the caller's input rather than the environment.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ContentError::InvalidInput(_)
                | ContentError::LengthNotPositive
                | ContentError::LengthTooLarge { .. }
                | ContentError::UnsupportedScheme(_)
                | ContentError::OutsideRoot(_)
        )
    }

    /// Whether the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound(_))
    }
}

/// Convenience result type.
pub type ContentResult<T> = Result<T, ContentError>;
