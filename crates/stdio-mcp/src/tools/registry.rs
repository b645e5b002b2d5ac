//! Tool registration and dispatch.

use serde_json::Value;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{ping, random_string};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![random_string::definition(), ping::definition()]
    }

    pub async fn call(name: &str, arguments: Option<Value>) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            random_string::NAME => random_string::execute(args).await,
            ping::NAME => ping::execute(args).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = ToolRegistry::call("nope", None).await.unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound(_)));
    }

    #[test]
    fn test_lists_every_tool() {
        let names: Vec<String> = ToolRegistry::list_tools()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["random_string", "ping"]);
    }
}
