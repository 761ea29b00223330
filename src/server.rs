/// Server setup and initialization
///
/// Wires together all components: store, model client, execution engine, and HTTP routes.
/// Provides the main application factory function for creating the Axum app.

use crate::{
    api::{create_api_routes, AppState},
    config::Config,
    llm::SimulatedModelClient,
    runtime::{engine::ExecutionEngine, executor::NodeExecutor},
    workflow::storage::Store,
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::SqliteConnectOptions;
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Create the main Axum application with all routes
///
/// Opens the database, builds the execution engine and mounts the HTTP routes.
pub async fn create_app(config: Config) -> Result<Router> {
    ensure_database_dir(&config.database.url)?;

    tracing::info!("📋 Opening store at {}", config.database.url);
    let store = Store::connect(&config.database.url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    let state = build_state(&config, store);
    tracing::info!("✅ Application initialized successfully");

    Ok(build_router(state))
}

/// Build shared state around an opened store
///
/// The store doubles as the engine's document source and log sink.
pub fn build_state(config: &Config, store: Store) -> AppState {
    tracing::info!("⚙️ Initializing node executor");
    let store_handle = Arc::new(store.clone());
    let model = Arc::new(SimulatedModelClient::from_config(&config.llm));
    let node_executor = NodeExecutor::new(store_handle.clone(), model, store_handle);

    tracing::info!("🚀 Initializing execution engine");
    let engine = Arc::new(ExecutionEngine::new(Arc::new(node_executor)));

    AppState {
        store,
        engine,
        run_timeout: config.engine.run_timeout_secs.map(Duration::from_secs),
    }
}

/// Mount every route on the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        .merge(create_api_routes().with_state(state))
}

/// Start the HTTP server with the given configuration
///
/// Creates the application and starts the Axum server on the configured address and port.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    let filter = EnvFilter::try_from_env("ASKFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting askflow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Create the parent directory of a file-backed SQLite database
fn ensure_database_dir(url: &str) -> Result<()> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| anyhow::anyhow!("Invalid database URL '{}': {}", url, e))?;

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tracing::info!("📁 Ensuring data directory exists: {}", parent.display());
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;
        }
    }

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
