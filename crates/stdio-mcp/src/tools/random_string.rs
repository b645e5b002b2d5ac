//! Tool: random_string. Generate a random alphanumeric string.

use serde::Deserialize;
use serde_json::{json, Value};

use mcp_content::{ContentError, DEFAULT_RANDOM_STRING_LENGTH, MAX_RANDOM_LENGTH};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

pub const NAME: &str = "random_string";

#[derive(Debug, Default, Deserialize)]
struct RandomStringParams {
    #[serde(default)]
    length: Option<i64>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some("Generate a random alphanumeric string".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "length": {
                    "type": "integer",
                    "description": "Number of characters to generate",
                    "default": DEFAULT_RANDOM_STRING_LENGTH,
                    "minimum": 1,
                    "maximum": MAX_RANDOM_LENGTH
                }
            }
        }),
    }
}

pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: RandomStringParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let length = match params.length {
        None => DEFAULT_RANDOM_STRING_LENGTH,
        Some(n) if n <= 0 => return Err(ContentError::LengthNotPositive.into()),
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
    };

    let value = mcp_content::random_string(length)?;
    tracing::debug!("Generated random string of length {length}");
    Ok(ToolCallResult::text(value))
}
