//! Anthropic Messages dialect: tool declarations as
//! `{name, description, input_schema}`, calls as typed `tool_use` blocks
//! in a content array, results as `tool_result` blocks on a user turn.

use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

use super::super::adapter::RenderedMessages;
use crate::domain::types::{ChatMessage, MessageRole, NormalizedToolCall, TokenUsage, ToolDefinition};

pub fn declarations(tools: &[ToolDefinition]) -> Value {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.input_schema,
            })
        })
        .collect()
}

pub fn render(messages: &[ChatMessage]) -> RenderedMessages {
    let mut system_parts = Vec::new();
    let mut rendered = Vec::new();
    let mut pending_results: Vec<Value> = Vec::new();

    for message in messages {
        // Tool results for one iteration collapse into a single user turn.
        if message.role != MessageRole::Tool && !pending_results.is_empty() {
            rendered.push(json!({
                "role": "user",
                "content": std::mem::take(&mut pending_results),
            }));
        }

        match message.role {
            MessageRole::System => system_parts.push(message.content.clone()),
            MessageRole::User => rendered.push(json!({
                "role": "user",
                "content": message.content,
            })),
            MessageRole::Assistant => {
                if message.tool_calls.is_empty() {
                    rendered.push(json!({
                        "role": "assistant",
                        "content": message.content,
                    }));
                } else {
                    let mut blocks = Vec::new();
                    if !message.content.is_empty() {
                        blocks.push(json!({"type": "text", "text": message.content}));
                    }
                    for call in &message.tool_calls {
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        }));
                    }
                    rendered.push(json!({"role": "assistant", "content": blocks}));
                }
            }
            MessageRole::Tool => pending_results.push(json!({
                "type": "tool_result",
                "tool_use_id": message.tool_call_id,
                "content": message.content,
            })),
        }
    }

    if !pending_results.is_empty() {
        rendered.push(json!({"role": "user", "content": pending_results}));
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    RenderedMessages {
        system,
        messages: Value::Array(rendered),
    }
}

pub fn extract_calls(raw: &Value) -> Vec<NormalizedToolCall> {
    let Some(blocks) = raw.get("content").and_then(Value::as_array) else {
        warn!("anthropic response has no content array; treating as no tool calls");
        return Vec::new();
    };

    blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
        .filter_map(|block| {
            let Some(name) = block.get("name").and_then(Value::as_str) else {
                warn!("tool_use block missing name; skipping");
                return None;
            };
            let id = block
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("toolu_{}", Uuid::new_v4().simple()));
            let arguments = block.get("input").cloned().unwrap_or_else(|| json!({}));
            Some(NormalizedToolCall::new(id, name, arguments))
        })
        .collect()
}

pub fn extract_text(raw: &Value) -> Option<String> {
    let blocks = raw.get("content").and_then(Value::as_array)?;
    let text: Vec<&str> = blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join("\n"))
    }
}

pub fn usage(raw: &Value) -> TokenUsage {
    let usage = raw.get("usage");
    TokenUsage::new(
        usage
            .and_then(|u| u.get("input_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        usage
            .and_then(|u| u.get("output_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
    )
}

pub fn force_directive(name: &str) -> Value {
    json!({"type": "tool", "name": name})
}
