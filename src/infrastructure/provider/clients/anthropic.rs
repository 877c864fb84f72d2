//! Anthropic Messages API client.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::ProviderClient;
use super::base::HttpClientBase;
use crate::config::ProviderConfig;
use crate::constants::DEFAULT_ANTHROPIC_API_PATH;
use crate::infrastructure::provider::adapter::{Dialect, ProviderAdapter};
use crate::infrastructure::provider::factory::resolve_api_key;
use crate::infrastructure::provider::types::{ProviderError, ProviderRequest, ProviderTurn};

#[derive(Clone)]
pub struct AnthropicClient {
    base: HttpClientBase,
    api_path: String,
    adapter: ProviderAdapter,
}

impl AnthropicClient {
    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), api_key, timeout),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_API_PATH.to_string()),
            adapter: ProviderAdapter::new(Dialect::Anthropic),
        }
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn dialect(&self) -> Dialect {
        Dialect::Anthropic
    }

    async fn send(&self, request: &ProviderRequest) -> Result<ProviderTurn, ProviderError> {
        let url = self.base.build_url(&self.api_path);
        let rendered = self.adapter.render_messages(&request.messages);

        let mut payload = json!({
            "model": request.model,
            "max_tokens": request.max_output_tokens,
            "temperature": request.temperature,
            "messages": rendered.messages,
        });
        if let Some(system) = rendered.system {
            payload["system"] = json!(system);
        }
        if !request.tools.is_empty() {
            payload["tools"] = self.adapter.convert_definitions(&request.tools);
        }
        if let Some(name) = &request.force_tool {
            if let Some(directive) = self.adapter.force_tool_directive(name) {
                payload["tool_choice"] = directive;
            }
        }

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            forced = request.force_tool.is_some(),
            "Sending request to Anthropic"
        );

        let raw = self.base.post_with_api_key_header(&url, &payload).await?;
        debug!("Received response from Anthropic");

        let usage = self.adapter.extract_usage(&raw);
        Ok(ProviderTurn { raw, usage })
    }
}
