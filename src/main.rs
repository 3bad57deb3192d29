//! Gateway Entry Point
//!
//! Loads configuration, initializes logging, connects the OpenProject client
//! and starts the configured transport.

use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use openproject_gateway::core::config::LogFormat;
use openproject_gateway::core::{Config, GatewayServer, TransportService};
use openproject_gateway::domains::openproject::OpenProjectClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config.logging.level, config.logging.format);

    info!("Starting {} v{}", config.server.name, config.server.version);
    config.log_summary();

    let client = Arc::new(OpenProjectClient::new(&config.backend)?);
    let server = GatewayServer::new(config.clone(), client);

    info!("Server initialized with {} tools", server.list_tools().len());

    // Create and run the transport service
    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr so the STDIO transport keeps stdout for protocol frames.
fn init_logging(level: &str, format: LogFormat) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Standard => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .init(),
    }
}
