//! Tool: ping. Send one ICMP echo to a host using the system `ping`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

pub const NAME: &str = "ping";

const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct PingParams {
    host: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some("Ping a host once and report the result".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "host": {
                    "type": "string",
                    "description": "Hostname or IP address"
                }
            },
            "required": ["host"]
        }),
    }
}

/// Hostnames, IPv4, and IPv6 literals only. Rejects anything `ping` could
/// read as an option.
fn validate_host(host: &str) -> McpResult<&str> {
    let host = host.trim();
    if host.is_empty() {
        return Err(McpError::InvalidParams("host must not be empty".to_string()));
    }
    if host.len() > 253 || host.starts_with('-') {
        return Err(McpError::InvalidParams(format!("invalid host '{host}'")));
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '_'))
    {
        return Err(McpError::InvalidParams(format!("invalid host '{host}'")));
    }
    Ok(host)
}

pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: PingParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
    let host = validate_host(&params.host)?;

    let mut command = Command::new("ping");
    command.args(["-c", "1", host]).kill_on_drop(true);

    tracing::debug!("Pinging {host}");
    let output = match tokio::time::timeout(PING_TIMEOUT, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Ok(ToolCallResult::error(format!("failed to run ping: {e}"))),
        Err(_) => {
            return Ok(ToolCallResult::error(format!(
                "ping {host} timed out after {}s",
                PING_TIMEOUT.as_secs()
            )))
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        Ok(ToolCallResult::text(stdout))
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(ToolCallResult::error(format!(
            "ping {host} failed ({}): {}{}",
            output.status,
            stdout.trim(),
            stderr.trim()
        )))
    }
}
