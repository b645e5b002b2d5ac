//! stdio-mcp-client: spawn an MCP server and walk through its surface.

use clap::Parser;
use serde_json::{json, Value};

use stdio_mcp::client::process::{ServerProcess, DEFAULT_SHUTDOWN_GRACE};
use stdio_mcp::config::ClientConfig;
use stdio_mcp::McpResult;

#[derive(Parser)]
#[command(
    name = "stdio-mcp-client",
    about = "Spawn an MCP server as a child process, run the handshake, and list what it offers",
    version
)]
struct Cli {
    /// Server executable to spawn.
    #[arg(long)]
    server: String,

    /// Extra argument passed to the server (repeatable).
    #[arg(long = "server-arg", allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Wire framing: content-length (default) or newline. Must match the server.
    /// Also reads MCP_FRAMING.
    #[arg(long)]
    framing: Option<String>,

    /// Per-request timeout in seconds, 0 for none.
    /// Also reads MCP_REQUEST_TIMEOUT_SECS.
    #[arg(long)]
    timeout: Option<u64>,

    /// Call this tool after listing.
    #[arg(long)]
    call_tool: Option<String>,

    /// JSON object of tool arguments for --call-tool.
    #[arg(long, default_value = "{}")]
    tool_args: String,

    /// Read this resource URI after listing.
    #[arg(long)]
    read: Option<String>,

    /// Fetch this prompt after listing.
    #[arg(long)]
    prompt: Option<String>,

    /// JSON object of prompt arguments for --prompt.
    #[arg(long, default_value = "{}")]
    prompt_args: String,

    /// Log level (trace, debug, info, warn, error). Logs go to stderr.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let tool_args: Value = serde_json::from_str(&cli.tool_args)
        .map_err(|e| anyhow::anyhow!("--tool-args is not valid JSON: {e}"))?;
    let prompt_args: Value = serde_json::from_str(&cli.prompt_args)
        .map_err(|e| anyhow::anyhow!("--prompt-args is not valid JSON: {e}"))?;

    let config = ClientConfig::resolve(cli.framing.as_deref(), cli.timeout)?;
    let process = ServerProcess::spawn(&cli.server, &cli.server_args, config)?;

    let outcome = explore(&process, &cli, tool_args, prompt_args).await;

    // Always give the server its EOF, even after a failed call.
    if let Some(status) = process.shutdown(DEFAULT_SHUTDOWN_GRACE).await? {
        if !status.success() {
            tracing::warn!("Server exited with {status}");
        }
    }

    let report = outcome?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn explore(
    process: &ServerProcess,
    cli: &Cli,
    tool_args: Value,
    prompt_args: Value,
) -> McpResult<Value> {
    let client = process.client();

    let init = client.initialize().await?;
    let tools = client.list_tools().await?;
    let resources = client.list_resources().await?;
    let templates = client.list_resource_templates().await?;
    let prompts = client.list_prompts().await?;

    let mut report = json!({
        "server": init.server_info,
        "protocol_version": init.protocol_version,
        "capabilities": init.capabilities,
        "tools": tools.tools,
        "resources": resources.resources,
        "resource_templates": templates.resource_templates,
        "prompts": prompts.prompts,
    });

    if let Some(name) = &cli.call_tool {
        let result = client.call_tool(name, Some(tool_args)).await?;
        report["tool_result"] = serde_json::to_value(result)?;
    }

    if let Some(uri) = &cli.read {
        let result = client.read_resource(uri).await?;
        report["resource"] = serde_json::to_value(result)?;
    }

    if let Some(name) = &cli.prompt {
        let result = client.get_prompt(name, Some(prompt_args)).await?;
        report["prompt"] = serde_json::to_value(result)?;
    }

    Ok(report)
}
