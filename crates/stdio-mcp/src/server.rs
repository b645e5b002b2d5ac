//! The server's method table: tools, resources, and prompts behind the
//! handler registry.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ServerConfig;
use crate::prompts::PromptRegistry;
use crate::protocol::{decode_optional_params, decode_params, HandlerRegistry};
use crate::resources::ResourceRegistry;
use crate::tools::ToolRegistry;
use crate::types::methods;
use crate::types::{
    ListParams, McpError, McpResult, PromptGetParams, PromptListResult, ResourceListResult,
    ResourceReadParams, ResourceTemplateListResult, ToolCallParams, ToolListResult,
};

fn to_value<T: serde::Serialize>(result: T) -> McpResult<Value> {
    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

fn log_cursor(method: &str, params: &ListParams) {
    if let Some(cursor) = &params.cursor {
        tracing::debug!("{method}: ignoring cursor '{cursor}', results are not paginated");
    }
}

/// Register every method this server answers.
pub fn default_registry(config: &ServerConfig) -> HandlerRegistry {
    let resources = ResourceRegistry::new(config.file_root.clone());
    if let Some(root) = &config.file_root {
        tracing::info!("File resources confined to {}", root.display());
    }
    register_all(resources)
}

fn register_all(resources: ResourceRegistry) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    let resources = Arc::new(resources);

    registry.register_fn(methods::PING, |_| async { Ok(Value::Object(serde_json::Map::new())) });

    registry.register_fn(methods::TOOLS_LIST, |params| async move {
        let list: ListParams = decode_optional_params(params)?;
        log_cursor(methods::TOOLS_LIST, &list);
        to_value(ToolListResult {
            tools: ToolRegistry::list_tools(),
            next_cursor: None,
        })
    });

    registry.register_fn(methods::TOOLS_CALL, |params| async move {
        let call: ToolCallParams = decode_params(methods::TOOLS_CALL, params)?;
        tracing::info!("Calling tool '{}'", call.name);
        let result = ToolRegistry::call(&call.name, call.arguments).await?;
        to_value(result)
    });

    let res = resources.clone();
    registry.register_fn(methods::RESOURCES_LIST, move |params| {
        let res = res.clone();
        async move {
            let list: ListParams = decode_optional_params(params)?;
            log_cursor(methods::RESOURCES_LIST, &list);
            to_value(ResourceListResult {
                resources: res.list_resources(),
                next_cursor: None,
            })
        }
    });

    let res = resources.clone();
    registry.register_fn(methods::RESOURCES_TEMPLATES_LIST, move |params| {
        let res = res.clone();
        async move {
            let list: ListParams = decode_optional_params(params)?;
            log_cursor(methods::RESOURCES_TEMPLATES_LIST, &list);
            to_value(ResourceTemplateListResult {
                resource_templates: res.list_templates(),
                next_cursor: None,
            })
        }
    });

    let res = resources;
    registry.register_fn(methods::RESOURCES_READ, move |params| {
        let res = res.clone();
        async move {
            let read: ResourceReadParams = decode_params(methods::RESOURCES_READ, params)?;
            to_value(res.read(&read.uri).await?)
        }
    });

    registry.register_fn(methods::PROMPTS_LIST, |params| async move {
        let list: ListParams = decode_optional_params(params)?;
        log_cursor(methods::PROMPTS_LIST, &list);
        to_value(PromptListResult {
            prompts: PromptRegistry::list_prompts(),
            next_cursor: None,
        })
    });

    registry.register_fn(methods::PROMPTS_GET, |params| async move {
        let get: PromptGetParams = decode_params(methods::PROMPTS_GET, params)?;
        to_value(PromptRegistry::get(&get.name, get.arguments).await?)
    });

    registry
}
