use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use figma_mcp_server::config::ServerConfig;
use figma_mcp_server::handlers::ServerContext;
use figma_mcp_server::server::McpServer;
use figma_mcp_server::upstream::FigmaClient;

/// Logs go to stderr; stdout carries protocol messages only.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("figma-mcp-server: configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_filter);

    let client = match FigmaClient::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Cannot build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let ctx = match ServerContext::from_config(&config, Arc::new(client)) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "Cannot build tool registry");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api_base_url,
        tools = ctx.registry.len(),
        max_attempts = config.max_attempts,
        "Starting figma-mcp-server"
    );

    let server = McpServer::new(ctx);
    match server.run().await {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
