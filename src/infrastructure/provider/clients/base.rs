//! Shared HTTP plumbing for the provider clients: auth variants, request
//! timeout, and bounded backoff on hard rate limits.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::constants::{
    ANTHROPIC_API_VERSION, RATE_LIMIT_BASE_DELAY_MS, RATE_LIMIT_MAX_ATTEMPTS,
    RATE_LIMIT_MAX_DELAY_MS,
};
use crate::infrastructure::provider::types::ProviderError;

#[derive(Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    timeout: Duration,
    http: Client,
}

impl HttpClientBase {
    pub fn new(
        id: String,
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            id,
            endpoint,
            api_key,
            timeout,
            http: Client::new(),
        }
    }

    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Post JSON with bearer auth (OpenAI-compatible backends).
    pub async fn post_with_bearer(&self, url: &str, body: &Value) -> Result<Value, ProviderError> {
        let api_key = self.require_api_key()?.to_string();
        self.post(url, body, move |req| req.bearer_auth(api_key.clone()))
            .await
    }

    /// Post JSON authenticated via `x-api-key` header (Anthropic).
    pub async fn post_with_api_key_header(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let api_key = self.require_api_key()?.to_string();
        self.post(url, body, move |req| {
            req.header("x-api-key", api_key.clone())
                .header("anthropic-version", ANTHROPIC_API_VERSION)
        })
        .await
    }

    /// Post JSON with query param auth (Gemini).
    pub async fn post_with_query_key(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let api_key = self.require_api_key()?;
        let url_with_key = format!("{url}?key={api_key}");
        self.post(&url_with_key, body, |req| req).await
    }

    /// Post JSON without auth (local services like Ollama).
    pub async fn post_no_auth(&self, url: &str, body: &Value) -> Result<Value, ProviderError> {
        self.post(url, body, |req| req).await
    }

    async fn post(
        &self,
        url: &str,
        body: &Value,
        decorate: impl Fn(RequestBuilder) -> RequestBuilder,
    ) -> Result<Value, ProviderError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let request = decorate(self.http.post(url).timeout(self.timeout).json(body));
            let response = request
                .send()
                .await
                .map_err(|e| ProviderError::unavailable(&self.id, e))?;

            // Hard rate limits are retried transparently; every other
            // status surfaces immediately.
            if response.status() == StatusCode::TOO_MANY_REQUESTS
                && attempt < RATE_LIMIT_MAX_ATTEMPTS
            {
                let delay = backoff_delay(attempt);
                warn!(
                    provider = self.id.as_str(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited; backing off before retry"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let response = response
                .error_for_status()
                .map_err(|e| ProviderError::unavailable(&self.id, e))?;

            return response
                .json()
                .await
                .map_err(|e| ProviderError::invalid_response(&self.id, e.to_string()));
        }
    }

    fn require_api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::missing_api_key(&self.id))
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp = RATE_LIMIT_BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(exp.min(RATE_LIMIT_MAX_DELAY_MS))
}
