//! Configuration management for the askflow server
//!
//! Handles server binding, database location, engine limits and model
//! provider credentials. Everything is read from the environment so the
//! binary runs unchanged in containers.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Workflow engine configuration
    pub engine: EngineConfig,
    /// Model provider configuration
    pub llm: LlmConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// SQLite database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL (e.g., "sqlite://data/askflow.db" or "sqlite::memory:")
    pub url: String,
}

/// Workflow engine limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Optional wall-clock limit for a whole run, applied by the HTTP layer
    pub run_timeout_secs: Option<u64>,
}

/// Model provider credentials and simulation knobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Artificial delay added to every simulated model call
    pub simulated_latency_ms: u64,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("ASKFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("ASKFLOW_PORT")
                    .unwrap_or_else(|_| "3005".to_string())
                    .parse()
                    .unwrap_or(3005),
            },
            database: DatabaseConfig {
                url: std::env::var("ASKFLOW_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/askflow.db".to_string()),
            },
            engine: EngineConfig {
                run_timeout_secs: std::env::var("ASKFLOW_RUN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
            llm: LlmConfig {
                simulated_latency_ms: std::env::var("ASKFLOW_SIMULATED_LATENCY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
                openai_api_key: non_empty_env("OPENAI_API_KEY"),
                gemini_api_key: non_empty_env("GEMINI_API_KEY"),
                anthropic_api_key: non_empty_env("ANTHROPIC_API_KEY"),
            },
        }
    }
}

/// Read an env var, treating an empty value as unset
fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
