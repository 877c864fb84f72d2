//! Request, response, and error types at the provider boundary.

use crate::domain::types::{ChatMessage, TokenUsage, ToolDefinition};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// One outbound turn to an LLM backend.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    /// Require the next turn to invoke this tool. Ignored by dialects that
    /// cannot honor it.
    pub force_tool: Option<String>,
    /// Constrain free-text output to this JSON schema where the backend
    /// has a native structured-output mode.
    pub response_schema: Option<Value>,
}

/// Raw backend reply plus normalized usage accounting. Call and text
/// extraction happen in the adapter, not here.
#[derive(Debug, Clone)]
pub struct ProviderTurn {
    pub raw: Value,
    pub usage: TokenUsage,
}

/// Provider-boundary failures. Transport problems are fatal to a run;
/// malformed payloads may still be recovered by adapter fallback parsing.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("provider '{provider}' is unavailable: {source}")]
    Unavailable {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ProviderError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Short operator-facing description of what went wrong.
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::MissingApiKey { provider } => {
                format!("Provider '{provider}' has no API key configured.")
            }
            ProviderError::Unavailable { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("Request to provider '{provider}' timed out.")
                } else if let Some(status) = source.status() {
                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            format!("Provider '{provider}' rejected the configured credentials.")
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            format!("Provider '{provider}' is rate limiting requests.")
                        }
                        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                            format!("Provider '{provider}' is temporarily unavailable.")
                        }
                        _ => format!(
                            "Request to provider '{provider}' failed: {}",
                            status.as_u16()
                        ),
                    }
                } else {
                    format!("Network error talking to provider '{provider}'.")
                }
            }
            ProviderError::InvalidResponse { provider, .. } => {
                format!("Provider '{provider}' returned a response that could not be parsed.")
            }
        }
    }
}
