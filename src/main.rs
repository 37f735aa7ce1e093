/// clusterdesk server entry point
///
/// Loads configuration from the environment and starts the HTTP server with
/// workflow orchestration and the host checker engine.

use clusterdesk::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow management API at /api/workflows/*
/// - CMDB host inventory at /api/cmdb/hosts/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3005 and data/clusterdesk.db)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
