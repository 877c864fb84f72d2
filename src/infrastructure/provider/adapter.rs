//! Dialect-tagged conversion between the normalized conversation model and
//! each backend's wire format.

use serde_json::Value;
use tracing::debug;

use super::adapters::{anthropic, gemini, ollama, openai};
use crate::domain::types::{ChatMessage, NormalizedToolCall, TokenUsage, ToolDefinition};

/// The closed set of wire dialects this core speaks. Selected once per run
/// from provider configuration, never by inspecting response objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Anthropic,
    OpenAi,
    Gemini,
    Ollama,
}

impl Dialect {
    /// Maps a config `provider_type` onto a dialect. Unknown types default
    /// to the OpenAI-compatible dialect, which most hosted backends speak.
    pub fn from_provider_type(provider_type: &str) -> Self {
        match provider_type.to_lowercase().as_str() {
            "anthropic" | "claude" => Dialect::Anthropic,
            "gemini" | "google" | "google-ai" => Dialect::Gemini,
            "ollama" | "localai" => Dialect::Ollama,
            _ => Dialect::OpenAi,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Anthropic => "anthropic",
            Dialect::OpenAi => "openai",
            Dialect::Gemini => "gemini",
            Dialect::Ollama => "ollama",
        }
    }
}

/// A conversation rendered for one dialect: the message array in wire
/// shape, plus system text split out for dialects that keep it outside
/// the message list.
#[derive(Debug, Clone)]
pub struct RenderedMessages {
    pub system: Option<String>,
    pub messages: Value,
}

/// Stateless converter for one dialect. Safe to share across runs.
#[derive(Debug, Clone, Copy)]
pub struct ProviderAdapter {
    dialect: Dialect,
}

impl ProviderAdapter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Converts the catalog into this dialect's tool-declaration shape.
    pub fn convert_definitions(&self, tools: &[ToolDefinition]) -> Value {
        match self.dialect {
            Dialect::Anthropic => anthropic::declarations(tools),
            Dialect::OpenAi => openai::declarations(tools),
            Dialect::Gemini => gemini::declarations(tools),
            Dialect::Ollama => ollama::declarations(tools),
        }
    }

    /// Renders the normalized conversation, including assistant tool calls
    /// and tool results, into this dialect's message array.
    pub fn render_messages(&self, messages: &[ChatMessage]) -> RenderedMessages {
        match self.dialect {
            Dialect::Anthropic => anthropic::render(messages),
            Dialect::OpenAi => openai::render(messages),
            Dialect::Gemini => gemini::render(messages),
            Dialect::Ollama => ollama::render(messages),
        }
    }

    /// Pulls normalized tool calls out of a raw backend response.
    ///
    /// Never fails: malformed payloads are logged by the dialect module
    /// and yield an empty list, leaving the continue/terminate decision to
    /// the controller.
    pub fn extract_calls(&self, raw: &Value) -> Vec<NormalizedToolCall> {
        match self.dialect {
            Dialect::Anthropic => anthropic::extract_calls(raw),
            Dialect::OpenAi => openai::extract_calls(raw),
            Dialect::Gemini => gemini::extract_calls(raw),
            Dialect::Ollama => ollama::extract_calls(raw),
        }
    }

    /// Free-text portion of a raw backend response, if any.
    pub fn extract_text(&self, raw: &Value) -> Option<String> {
        match self.dialect {
            Dialect::Anthropic => anthropic::extract_text(raw),
            Dialect::OpenAi => openai::extract_text(raw),
            Dialect::Gemini => gemini::extract_text(raw),
            Dialect::Ollama => ollama::extract_text(raw),
        }
    }

    pub fn extract_usage(&self, raw: &Value) -> TokenUsage {
        match self.dialect {
            Dialect::Anthropic => anthropic::usage(raw),
            Dialect::OpenAi => openai::usage(raw),
            Dialect::Gemini => gemini::usage(raw),
            Dialect::Ollama => ollama::usage(raw),
        }
    }

    /// Wire directive forcing the named tool, for dialects that honor one.
    ///
    /// Gemini has no reliable forced-tool mechanism (callers use its
    /// structured-output mode instead) and the Ollama dialect produces
    /// malformed output when a tool choice is forced, so both return
    /// `None`; for Ollama the drop is logged as the documented limitation.
    pub fn force_tool_directive(&self, name: &str) -> Option<Value> {
        match self.dialect {
            Dialect::Anthropic => Some(anthropic::force_directive(name)),
            Dialect::OpenAi => Some(openai::force_directive(name)),
            Dialect::Gemini => None,
            Dialect::Ollama => {
                debug!(
                    tool = name,
                    "Ignoring forced-tool directive: unsupported by ollama dialect"
                );
                None
            }
        }
    }

    pub fn supports_forced_tool(&self) -> bool {
        matches!(self.dialect, Dialect::Anthropic | Dialect::OpenAi)
    }

    /// Whether the backend offers a structured-output mode distinct from
    /// tool calling.
    pub fn supports_structured_output(&self) -> bool {
        matches!(self.dialect, Dialect::Gemini)
    }
}
