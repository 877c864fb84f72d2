mod anthropic;
mod base;
mod gemini;
mod ollama;
mod openai;

pub use anthropic::AnthropicClient;
pub use base::HttpClientBase;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use async_trait::async_trait;

use super::adapter::Dialect;
use super::types::{ProviderError, ProviderRequest, ProviderTurn};

/// One LLM backend. Implementations perform exactly one outbound request
/// per `send`; retries exist only inside the hard-rate-limit backoff.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> &str;

    fn dialect(&self) -> Dialect;

    async fn send(&self, request: &ProviderRequest) -> Result<ProviderTurn, ProviderError>;
}
