//! Ollama client for local models. No auth, no forced tool choice; tool
//! declarations are still sent for models that understand them, and the
//! adapter's free-text recovery covers the ones that do not.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::ProviderClient;
use super::base::HttpClientBase;
use crate::config::ProviderConfig;
use crate::constants::DEFAULT_OLLAMA_API_PATH;
use crate::infrastructure::provider::adapter::{Dialect, ProviderAdapter};
use crate::infrastructure::provider::types::{ProviderError, ProviderRequest, ProviderTurn};

#[derive(Clone)]
pub struct OllamaClient {
    base: HttpClientBase,
    api_path: String,
    adapter: ProviderAdapter,
}

impl OllamaClient {
    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Self {
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), None, timeout),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_API_PATH.to_string()),
            adapter: ProviderAdapter::new(Dialect::Ollama),
        }
    }
}

#[async_trait]
impl ProviderClient for OllamaClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn dialect(&self) -> Dialect {
        Dialect::Ollama
    }

    async fn send(&self, request: &ProviderRequest) -> Result<ProviderTurn, ProviderError> {
        let url = self.base.build_url(&self.api_path);
        let rendered = self.adapter.render_messages(&request.messages);

        let mut payload = json!({
            "model": request.model,
            "messages": rendered.messages,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_output_tokens,
            }
        });
        if !request.tools.is_empty() {
            payload["tools"] = self.adapter.convert_definitions(&request.tools);
        }
        if let Some(name) = &request.force_tool {
            // Returns None and logs; forcing produces malformed output here.
            let _ = self.adapter.force_tool_directive(name);
        }

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to Ollama"
        );

        let raw = self.base.post_no_auth(&url, &payload).await?;
        debug!("Received response from Ollama");

        let usage = self.adapter.extract_usage(&raw);
        Ok(ProviderTurn { raw, usage })
    }
}
