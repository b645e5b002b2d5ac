//! stdio-mcp server entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use stdio_mcp::config::ServerConfig;
use stdio_mcp::prompts::PromptRegistry;
use stdio_mcp::resources::ResourceRegistry;
use stdio_mcp::server::default_registry;
use stdio_mcp::tools::ToolRegistry;
use stdio_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "stdio-mcp",
    about = "MCP server speaking JSON-RPC over stdin/stdout",
    version
)]
struct Cli {
    /// Wire framing: content-length (default) or newline.
    /// Also reads MCP_FRAMING.
    #[arg(long, global = true)]
    framing: Option<String>,

    /// Directory that file:// resources must live under.
    /// Also reads MCP_FILE_ROOT.
    #[arg(long, global = true)]
    file_root: Option<String>,

    /// Log level (trace, debug, info, warn, error). Logs go to stderr.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one MCP session over stdio (default).
    Serve,

    /// Print server capabilities, tools, resources, and prompts as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   stdio-mcp completions bash > ~/.local/share/bash-completion/completions/stdio-mcp
    ///   stdio-mcp completions zsh > ~/.zfunc/_stdio-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    // stdout carries protocol frames; logs must never go there.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::resolve(cli.framing.as_deref(), cli.file_root.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!(
                "{} v{} ({} framing)",
                config.server_info.name,
                config.server_info.version,
                config.framing
            );
            let registry = default_registry(&config);
            let transport = StdioTransport::new(registry, config);
            transport.run().await?;
        }

        Commands::Info => {
            let init = config.initialize_result();
            let resources = ResourceRegistry::new(config.file_root.clone());
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": init.server_info,
                "protocol_version": init.protocol_version,
                "framing": config.framing.as_str(),
                "capabilities": init.capabilities,
                "methods": default_registry(&config).methods(),
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "resources": resources.list_resources().iter().map(|r| &r.uri).collect::<Vec<_>>(),
                "resource_templates": resources
                    .list_templates()
                    .iter()
                    .map(|t| &t.uri_template)
                    .collect::<Vec<_>>(),
                "prompts": PromptRegistry::list_prompts()
                    .iter()
                    .map(|p| &p.name)
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "stdio-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
