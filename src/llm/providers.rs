//! Known model providers and the simulated client
//!
//! The catalog mirrors what the builder's configuration panel offers. The
//! simulated client enforces the same credential checks a real integration
//! would and answers with a canned response.

use super::{ModelClient, ModelError, ModelRequest};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// A provider entry in the catalog
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    /// Lookup key used in LLMEngine config (e.g., "openai")
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    pub models: Vec<&'static str>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl ProviderInfo {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// The fixed set of supported providers
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<ProviderInfo>,
}

impl ProviderCatalog {
    /// Build the catalog with credentials taken from configuration
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            providers: vec![
                ProviderInfo {
                    key: "openai",
                    name: "OpenAI",
                    models: vec!["gpt-4", "gpt-3.5-turbo", "gpt-4-turbo"],
                    api_key: config.openai_api_key.clone(),
                },
                ProviderInfo {
                    key: "gemini",
                    name: "Google Gemini",
                    models: vec!["gemini-pro", "gemini-pro-vision"],
                    api_key: config.gemini_api_key.clone(),
                },
                ProviderInfo {
                    key: "claude",
                    name: "Anthropic Claude",
                    models: vec!["claude-3-opus", "claude-3-sonnet", "claude-3-haiku"],
                    api_key: config.anthropic_api_key.clone(),
                },
            ],
        }
    }

    pub fn get(&self, key: &str) -> Option<&ProviderInfo> {
        self.providers.iter().find(|p| p.key == key)
    }

    pub fn providers(&self) -> &[ProviderInfo] {
        &self.providers
    }
}

/// Offline stand-in for provider integrations
#[derive(Debug, Clone)]
pub struct SimulatedModelClient {
    catalog: ProviderCatalog,
    latency: Duration,
}

impl SimulatedModelClient {
    pub fn new(catalog: ProviderCatalog, latency: Duration) -> Self {
        Self { catalog, latency }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            ProviderCatalog::from_config(config),
            Duration::from_millis(config.simulated_latency_ms),
        )
    }
}

#[async_trait]
impl ModelClient for SimulatedModelClient {
    async fn call_model(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let provider = self
            .catalog
            .get(&request.provider)
            .ok_or_else(|| ModelError::UnsupportedProvider(request.provider.clone()))?;

        if !provider.is_configured() {
            return Err(ModelError::ApiKeyMissing(provider.name.to_string()));
        }

        tracing::debug!(
            "🤖 Simulated {} call: model={} temperature={}",
            provider.name,
            request.model,
            request.temperature
        );
        tracing::debug!("📝 System prompt: {}", request.system_prompt);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let preview: String = request.prompt.chars().take(100).collect();
        Ok(format!(
            "This is a simulated response from {}. In a real implementation, this would be the actual LLM response to: \"{}...\"",
            request.model, preview
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(provider: &str, prompt: &str) -> ModelRequest {
        ModelRequest {
            provider: provider.to_string(),
            model: "gpt-4".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            prompt: prompt.to_string(),
            temperature: 0.7,
        }
    }

    fn config_with_openai_key() -> LlmConfig {
        LlmConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn catalog_lists_three_providers() {
        let catalog = ProviderCatalog::from_config(&LlmConfig::default());
        let keys: Vec<&str> = catalog.providers().iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["openai", "gemini", "claude"]);
        assert!(catalog.get("claude").unwrap().models.contains(&"claude-3-haiku"));
        assert!(catalog.get("mistral").is_none());
    }

    #[tokio::test]
    async fn missing_key_is_an_error() {
        let client = SimulatedModelClient::from_config(&LlmConfig::default());
        let err = client.call_model(&request("openai", "hi")).await.unwrap_err();
        assert!(matches!(err, ModelError::ApiKeyMissing(_)));
        assert_eq!(err.to_string(), "OpenAI API key not configured");
    }

    #[tokio::test]
    async fn unknown_provider_is_an_error() {
        let client = SimulatedModelClient::from_config(&config_with_openai_key());
        let err = client.call_model(&request("mistral", "hi")).await.unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedProvider(p) if p == "mistral"));
    }

    #[tokio::test]
    async fn configured_provider_answers_with_prompt_preview() {
        let client = SimulatedModelClient::from_config(&config_with_openai_key());
        let prompt = "x".repeat(150);
        let response = client.call_model(&request("openai", &prompt)).await.unwrap();

        assert!(response.starts_with("This is a simulated response from gpt-4."));
        assert!(response.contains(&format!("\"{}...\"", "x".repeat(100))));
        assert!(!response.contains(&"x".repeat(101)));
    }
}
