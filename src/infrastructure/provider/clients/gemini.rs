//! Gemini generateContent client. Forced tool choice is not reliable on
//! this backend; callers that need schema compliance set
//! `response_schema`, which maps onto Gemini's native structured-output
//! mode instead.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::ProviderClient;
use super::base::HttpClientBase;
use crate::config::ProviderConfig;
use crate::constants::DEFAULT_GEMINI_API_PATH;
use crate::infrastructure::provider::adapter::{Dialect, ProviderAdapter};
use crate::infrastructure::provider::factory::resolve_api_key;
use crate::infrastructure::provider::types::{ProviderError, ProviderRequest, ProviderTurn};

#[derive(Clone)]
pub struct GeminiClient {
    base: HttpClientBase,
    api_path: String,
    adapter: ProviderAdapter,
}

impl GeminiClient {
    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), api_key, timeout),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_API_PATH.to_string()),
            adapter: ProviderAdapter::new(Dialect::Gemini),
        }
    }

    fn build_model_url(&self, model: &str) -> String {
        let base = self.base.endpoint.trim_end_matches('/');
        let path = self.api_path.trim_matches('/');
        format!("{base}/{path}/{model}:generateContent")
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn dialect(&self) -> Dialect {
        Dialect::Gemini
    }

    async fn send(&self, request: &ProviderRequest) -> Result<ProviderTurn, ProviderError> {
        let url = self.build_model_url(&request.model);
        let rendered = self.adapter.render_messages(&request.messages);

        let mut generation_config = json!({
            "temperature": request.temperature,
            "maxOutputTokens": request.max_output_tokens,
        });
        if let Some(schema) = &request.response_schema {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = schema.clone();
        }

        let mut payload = json!({
            "contents": rendered.messages,
            "generationConfig": generation_config,
        });
        if let Some(system) = rendered.system {
            payload["systemInstruction"] = json!({"parts": [{"text": system}]});
        }
        if !request.tools.is_empty() {
            payload["tools"] = self.adapter.convert_definitions(&request.tools);
        }

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            structured = request.response_schema.is_some(),
            "Sending request to Gemini"
        );

        let raw = self.base.post_with_query_key(&url, &payload).await?;
        debug!("Received response from Gemini");

        let usage = self.adapter.extract_usage(&raw);
        Ok(ProviderTurn { raw, usage })
    }
}
