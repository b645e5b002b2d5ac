//! `file://` resource reading.

use std::path::{Path, PathBuf};

use base64::Engine;
use url::Url;

use crate::types::{ContentError, ContentResult, FileBody, FileContent, DEFAULT_MIME_TYPE};

/// Largest file served as a resource.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Reads files named by `file://` URIs, optionally confined to a root directory.
#[derive(Debug, Clone)]
pub struct FileResourceReader {
    root: Option<PathBuf>,
    max_bytes: u64,
}

impl FileResourceReader {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            max_bytes: MAX_FILE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolve a `file://` URI into an absolute path on this machine.
    pub fn resolve(&self, uri: &str) -> ContentResult<PathBuf> {
        let url = Url::parse(uri)
            .map_err(|e| ContentError::InvalidInput(format!("Invalid URI '{uri}': {e}")))?;

        if url.scheme() != "file" {
            return Err(ContentError::UnsupportedScheme(url.scheme().to_string()));
        }

        let path = url.to_file_path().map_err(|_| {
            ContentError::InvalidInput(format!(
                "File URI must name an absolute local path: {uri}"
            ))
        })?;

        let canonical = std::fs::canonicalize(&path).map_err(|e| map_io(e, &path))?;

        if let Some(root) = &self.root {
            let root = std::fs::canonicalize(root).map_err(|e| map_io(e, root))?;
            if !canonical.starts_with(&root) {
                return Err(ContentError::OutsideRoot(path.display().to_string()));
            }
        }

        Ok(canonical)
    }

    /// Read the file behind a `file://` URI.
    pub fn read(&self, uri: &str) -> ContentResult<FileContent> {
        let path = self.resolve(uri)?;
        tracing::debug!("Reading file resource: {}", path.display());

        let meta = std::fs::metadata(&path).map_err(|e| map_io(e, &path))?;
        if !meta.is_file() {
            return Err(ContentError::InvalidInput(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }
        if meta.len() > self.max_bytes {
            return Err(ContentError::TooLarge {
                size: meta.len(),
                max: self.max_bytes,
            });
        }

        let bytes = std::fs::read(&path).map_err(|e| map_io(e, &path))?;
        let size = bytes.len() as u64;
        let body = match String::from_utf8(bytes) {
            Ok(text) => FileBody::Text(text),
            Err(e) => FileBody::Blob(
                base64::engine::general_purpose::STANDARD.encode(e.into_bytes()),
            ),
        };

        Ok(FileContent {
            mime_type: guess_mime_type(&path).to_string(),
            path,
            size,
            body,
        })
    }
}

impl Default for FileResourceReader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn map_io(e: std::io::Error, path: &Path) -> ContentError {
    match e.kind() {
        std::io::ErrorKind::NotFound => ContentError::NotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => {
            ContentError::PermissionDenied(path.display().to_string())
        }
        _ => ContentError::Io(e),
    }
}

/// Guess a MIME type from the file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("txt" | "log") => "text/plain",
        Some("md" | "markdown") => "text/markdown",
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("toml") => "application/toml",
        Some("yaml" | "yml") => "application/yaml",
        Some("xml") => "application/xml",
        Some("js") => "text/javascript",
        Some("rs") => "text/x-rust",
        Some("go") => "text/x-go",
        Some("py") => "text/x-python",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        _ => DEFAULT_MIME_TYPE,
    }
}
