/// askflow server entry point
///
/// Initializes configuration from the environment and starts the HTTP server.

use askflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow management and execution at /api/workflows/*
/// - Chat at /api/chat/*
/// - Document uploads at /api/documents
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
