use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use mcp_ask_human::config::get_settings;
use mcp_ask_human::mcp::server::McpServer;
use mcp_ask_human::mcp::tools::AskUserTool;
use mcp_ask_human::{init_telemetry, TelemetryConfig};

/// MCP server that asks the human at the keyboard
///
/// Speaks JSON-RPC over stdin/stdout and exposes one tool, `ask_user`, which
/// opens a terminal window with the questions and returns the answers.
#[derive(Parser, Debug)]
#[command(name = "mcp-ask-human")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Specify alternate configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = get_settings(cli.config.as_deref()).context("failed to load configuration")?;

    init_telemetry(TelemetryConfig {
        log_level: cli.log_level.unwrap_or_else(|| settings.logger.level.clone()),
        ..TelemetryConfig::default()
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let exchange = settings.exchange();
    info!(
        workspace_root = %exchange.workspace_root().display(),
        launchers = ?settings.terminal.launchers,
        "Starting mcp-ask-human"
    );

    let server = McpServer::new(Arc::new(AskUserTool::new(exchange))).await;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = server.serve(stdin, tokio::io::stdout()) => {
            result.context("MCP server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
