//! Prompt registration and dispatch.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptDefinition, PromptGetResult};

use super::query;

pub struct PromptRegistry;

impl PromptRegistry {
    pub fn list_prompts() -> Vec<PromptDefinition> {
        vec![query::definition()]
    }

    pub async fn get(name: &str, arguments: Option<Value>) -> McpResult<PromptGetResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            mcp_content::QUERY_PROMPT_NAME => query::expand(args),
            _ => Err(McpError::PromptNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_query_with_topic() {
        let result = PromptRegistry::get("query", Some(json!({"topic": "rust"})))
            .await
            .unwrap();
        let text = result.messages[0].content.as_text().unwrap();
        assert!(text.contains("rust"));
    }

    #[tokio::test]
    async fn test_unknown_prompt() {
        let err = PromptRegistry::get("observe", None).await.unwrap_err();
        assert!(matches!(err, McpError::PromptNotFound(_)));
    }

    #[tokio::test]
    async fn test_non_string_topic_rejected() {
        let err = PromptRegistry::get("query", Some(json!({"topic": 5})))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }
}
