//! Resource URI templates and static resource definitions.

use mcp_content::MAX_RANDOM_LENGTH;

use crate::types::{ResourceDefinition, ResourceTemplateDefinition};

use super::random_data;

pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
    vec![
        ResourceTemplateDefinition {
            uri_template: format!("{}?length={{length}}", random_data::URI),
            name: "Random Data".to_string(),
            description: Some(format!(
                "Printable ASCII noise of the requested length (1 to {MAX_RANDOM_LENGTH})"
            )),
            mime_type: Some("text/plain".to_string()),
        },
        ResourceTemplateDefinition {
            uri_template: "file://{path}".to_string(),
            name: "Local File".to_string(),
            description: Some(
                "A file on the server host, addressed by absolute path".to_string(),
            ),
            mime_type: None,
        },
    ]
}

pub fn list_resources() -> Vec<ResourceDefinition> {
    vec![ResourceDefinition {
        uri: random_data::URI.to_string(),
        name: "Random Data".to_string(),
        description: Some("Random printable ASCII text; append ?length=N to choose the size".to_string()),
        mime_type: Some("text/plain".to_string()),
    }]
}
