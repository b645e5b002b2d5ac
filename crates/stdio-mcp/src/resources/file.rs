//! Resource: file://. Contents of a local file.

use std::sync::Arc;

use mcp_content::{FileBody, FileResourceReader};

use crate::types::{McpError, McpResult, ReadResourceResult, ResourceContent};

pub fn matches(uri: &str) -> bool {
    uri.starts_with("file://")
}

/// Read the file off the async runtime and wrap it as resource content.
pub async fn read_file(
    uri: &str,
    reader: &Arc<FileResourceReader>,
) -> McpResult<ReadResourceResult> {
    let reader = Arc::clone(reader);
    let target = uri.to_string();
    let file = tokio::task::spawn_blocking(move || reader.read(&target))
        .await
        .map_err(|e| McpError::InternalError(format!("file read task failed: {e}")))??;

    tracing::debug!(
        "Read {} ({} bytes, {})",
        file.path.display(),
        file.size,
        file.mime_type
    );

    let content = match file.body {
        FileBody::Text(text) => ResourceContent::text(uri, file.mime_type, text),
        FileBody::Blob(blob) => ResourceContent::blob(uri, file.mime_type, blob),
    };
    Ok(ReadResourceResult {
        contents: vec![content],
    })
}
