//! Ollama dialect: OpenAI-like declarations, but many local models have no
//! native tool calling and answer with JSON-looking free text instead.
//! Extraction therefore runs a named degraded mode: native `tool_calls`
//! first, then the bounded JSON recovery chain over the message text, with
//! normalization of dotted tool names and malformed argument shapes.

use serde_json::{Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use super::super::adapter::RenderedMessages;
use super::recovery;
use crate::domain::types::{ChatMessage, MessageRole, NormalizedToolCall, TokenUsage, ToolDefinition};

pub fn declarations(tools: &[ToolDefinition]) -> Value {
    super::openai::declarations(tools)
}

pub fn render(messages: &[ChatMessage]) -> RenderedMessages {
    let rendered: Vec<Value> = messages
        .iter()
        .map(|message| match message.role {
            MessageRole::Tool => json!({
                "role": "tool",
                "content": message.content,
            }),
            MessageRole::Assistant if !message.tool_calls.is_empty() => {
                let calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "function": {"name": call.name, "arguments": call.arguments}
                        })
                    })
                    .collect();
                json!({
                    "role": "assistant",
                    "content": message.content,
                    "tool_calls": calls,
                })
            }
            _ => json!({
                "role": message.role.as_str(),
                "content": message.content,
            }),
        })
        .collect();

    RenderedMessages {
        system: None,
        messages: Value::Array(rendered),
    }
}

pub fn extract_calls(raw: &Value) -> Vec<NormalizedToolCall> {
    let Some(message) = raw.get("message") else {
        warn!("ollama response has no message object; treating as no tool calls");
        return Vec::new();
    };

    // Models with native tool support populate tool_calls directly.
    if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
        return calls
            .iter()
            .filter_map(|call| {
                let function = call.get("function")?;
                let name = function.get("name").and_then(Value::as_str)?;
                let arguments = coerce_arguments(function.get("arguments").cloned());
                Some(NormalizedToolCall::new(
                    synthesize_id(),
                    normalize_name(name),
                    arguments,
                ))
            })
            .collect();
    }

    // Degraded mode: the model emitted its call as free text.
    let Some(content) = message.get("content").and_then(Value::as_str) else {
        return Vec::new();
    };
    let Some(value) = recovery::extract_json(content) else {
        return Vec::new();
    };
    match call_from_value(&value) {
        Some(call) => {
            debug!(tool = %call.name, "Recovered tool call from free-text response");
            vec![call]
        }
        None => Vec::new(),
    }
}

/// Interprets a recovered JSON object as a tool call. Accepts the handful
/// of field spellings local models actually produce; anything else is
/// treated as a plain-text answer.
fn call_from_value(value: &Value) -> Option<NormalizedToolCall> {
    let object = value.as_object()?;

    let name = object
        .get("name")
        .or_else(|| object.get("tool"))
        .or_else(|| object.get("function"))
        .and_then(Value::as_str)?;

    let arguments = object
        .get("arguments")
        .or_else(|| object.get("args"))
        .or_else(|| object.get("input"))
        .or_else(|| object.get("parameters"))
        .cloned();

    Some(NormalizedToolCall::new(
        synthesize_id(),
        normalize_name(name),
        coerce_arguments(arguments),
    ))
}

/// Local models often echo namespaced names like `biotools.lookup`; the
/// downstream catalog knows only the bare tool name.
fn normalize_name(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).trim().to_string()
}

/// Coerces whatever the model put in the arguments slot into the object
/// shape downstream tools expect.
fn coerce_arguments(raw: Option<Value>) -> Value {
    match raw {
        Some(Value::Object(map)) => Value::Object(map),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => json!({"input": text}),
        },
        Some(Value::Null) | None => json!({}),
        Some(other) => json!({"input": other}),
    }
}

fn synthesize_id() -> String {
    format!("ollama_{}", Uuid::new_v4().simple())
}

pub fn extract_text(raw: &Value) -> Option<String> {
    raw.get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn usage(raw: &Value) -> TokenUsage {
    TokenUsage::new(
        raw.get("prompt_eval_count")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        raw.get("eval_count").and_then(Value::as_u64).unwrap_or(0),
    )
}
