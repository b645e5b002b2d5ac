//! Resource registration and dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use mcp_content::FileResourceReader;

use crate::types::{
    McpError, McpResult, ReadResourceResult, ResourceDefinition, ResourceTemplateDefinition,
};

use super::{file, random_data, templates};

/// Serves `data://random_data` and `file://` URIs.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    files: Arc<FileResourceReader>,
}

impl ResourceRegistry {
    pub fn new(file_root: Option<PathBuf>) -> Self {
        Self {
            files: Arc::new(FileResourceReader::new(file_root)),
        }
    }

    pub fn list_templates(&self) -> Vec<ResourceTemplateDefinition> {
        templates::list_templates()
    }

    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        templates::list_resources()
    }

    pub async fn read(&self, uri: &str) -> McpResult<ReadResourceResult> {
        if random_data::matches(uri) {
            random_data::read_random_data(uri).await
        } else if file::matches(uri) {
            file::read_file(uri, &self.files).await
        } else {
            Err(McpError::ResourceNotFound(uri.to_string()))
        }
    }
}
