//! Model provider seam
//!
//! The LLMEngine step hands a fully built prompt to a `ModelClient`. Real
//! provider integrations plug in here; the crate ships a catalog of known
//! providers and a simulated client that needs no network access.

pub mod providers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use providers::{ProviderCatalog, ProviderInfo, SimulatedModelClient};

/// Everything a provider needs to answer one prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    /// Provider key (e.g., "openai", "gemini", "claude")
    pub provider: String,
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Model call failures
#[derive(Debug, Error)]
pub enum ModelError {
    /// Credentials for the provider are not configured
    #[error("{0} API key not configured")]
    ApiKeyMissing(String),

    /// The provider key is not in the catalog
    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    /// The provider answered with an error
    #[error("{provider} call failed: {message}")]
    Provider { provider: String, message: String },
}

/// Core trait for model provider clients
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn call_model(&self, request: &ModelRequest) -> Result<String, ModelError>;
}
