//! Prompt: query. Frame a user question for the model.

use serde::Deserialize;
use serde_json::Value;

use crate::types::{
    Content, McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult,
    PromptMessage, Role,
};

#[derive(Debug, Default, Deserialize)]
struct QueryArgs {
    #[serde(default)]
    topic: Option<String>,
}

pub fn definition() -> PromptDefinition {
    PromptDefinition {
        name: mcp_content::QUERY_PROMPT_NAME.to_string(),
        description: Some("Guide the model through answering a user query".to_string()),
        arguments: Some(vec![PromptArgument {
            name: "topic".to_string(),
            description: Some("Optional subject the query is about".to_string()),
            required: false,
        }]),
    }
}

pub fn expand(args: Value) -> McpResult<PromptGetResult> {
    let args: QueryArgs =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let text = mcp_content::query_prompt(args.topic.as_deref());

    Ok(PromptGetResult {
        description: Some("Answer the user's query".to_string()),
        messages: vec![PromptMessage {
            role: Role::Assistant,
            content: Content::text(text),
        }],
    })
}
