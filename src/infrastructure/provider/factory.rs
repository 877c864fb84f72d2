//! Provider factory - creates clients from config.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::clients::{AnthropicClient, GeminiClient, OllamaClient, OpenAiClient, ProviderClient};
use crate::config::ProviderConfig;
use crate::infrastructure::provider::adapter::Dialect;

/// Resolve API key from the environment variable named in config.
pub fn resolve_api_key(provider: &str, spec: Option<&str>) -> Option<String> {
    let Some(raw) = spec.map(str::trim) else {
        return None;
    };
    if raw.is_empty() {
        return None;
    }
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating provider clients from configuration.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates the client matching the config's `provider_type`.
    ///
    /// Supported types:
    /// - `anthropic`, `claude` → Anthropic Messages dialect
    /// - `gemini`, `google` → Gemini dialect
    /// - `ollama`, `localai` → Ollama dialect
    /// - Others → OpenAI-compatible dialect (default)
    pub fn create(config: &ProviderConfig, timeout: Duration) -> Arc<dyn ProviderClient> {
        match Dialect::from_provider_type(&config.provider_type) {
            Dialect::Anthropic => Arc::new(AnthropicClient::from_config(config, timeout)),
            Dialect::Gemini => Arc::new(GeminiClient::from_config(config, timeout)),
            Dialect::Ollama => Arc::new(OllamaClient::from_config(config, timeout)),
            Dialect::OpenAi => Arc::new(OpenAiClient::from_config(config, timeout)),
        }
    }
}
