//! Gemini dialect: declarations nested under one `functionDeclarations`
//! list, calls as `functionCall` parts (or the legacy flat `functionCalls`
//! accessor), results as `functionResponse` parts. The backend supplies no
//! call identifiers, so this module synthesizes them.

use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

use super::super::adapter::RenderedMessages;
use crate::domain::types::{ChatMessage, MessageRole, NormalizedToolCall, TokenUsage, ToolDefinition};

pub fn declarations(tools: &[ToolDefinition]) -> Value {
    let declarations: Vec<Value> = tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema,
            })
        })
        .collect();
    json!([{"functionDeclarations": declarations}])
}

pub fn render(messages: &[ChatMessage]) -> RenderedMessages {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();
    let mut pending_responses: Vec<Value> = Vec::new();

    for message in messages {
        if message.role != MessageRole::Tool && !pending_responses.is_empty() {
            contents.push(json!({
                "role": "user",
                "parts": std::mem::take(&mut pending_responses),
            }));
        }

        match message.role {
            MessageRole::System => system_parts.push(message.content.clone()),
            MessageRole::User => contents.push(json!({
                "role": "user",
                "parts": [{"text": message.content}],
            })),
            MessageRole::Assistant => {
                let mut parts = Vec::new();
                if !message.content.is_empty() {
                    parts.push(json!({"text": message.content}));
                }
                for call in &message.tool_calls {
                    parts.push(json!({
                        "functionCall": {"name": call.name, "args": call.arguments}
                    }));
                }
                if parts.is_empty() {
                    parts.push(json!({"text": ""}));
                }
                contents.push(json!({"role": "model", "parts": parts}));
            }
            MessageRole::Tool => pending_responses.push(json!({
                "functionResponse": {
                    "name": message.tool_name,
                    "response": {"content": message.content},
                }
            })),
        }
    }

    if !pending_responses.is_empty() {
        contents.push(json!({"role": "user", "parts": pending_responses}));
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    RenderedMessages {
        system,
        messages: Value::Array(contents),
    }
}

pub fn extract_calls(raw: &Value) -> Vec<NormalizedToolCall> {
    let parts = raw
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array);

    if parts.is_none() && raw.get("functionCalls").is_none() {
        warn!("gemini response has no candidate parts; treating as no tool calls");
    }

    let mut calls = Vec::new();
    if let Some(parts) = parts {
        for part in parts {
            if let Some(function_call) = part.get("functionCall") {
                if let Some(call) = normalize_call(function_call) {
                    calls.push(call);
                }
            }
        }
    }

    // Older API surfaces expose calls through a flat accessor instead of
    // structured parts.
    if calls.is_empty() {
        if let Some(legacy) = raw.get("functionCalls").and_then(Value::as_array) {
            for function_call in legacy {
                if let Some(call) = normalize_call(function_call) {
                    calls.push(call);
                }
            }
        }
    }

    calls
}

fn normalize_call(function_call: &Value) -> Option<NormalizedToolCall> {
    let Some(name) = function_call.get("name").and_then(Value::as_str) else {
        warn!("functionCall missing name; skipping");
        return None;
    };
    let arguments = function_call.get("args").cloned().unwrap_or_else(|| json!({}));
    Some(NormalizedToolCall::new(synthesize_id(), name, arguments))
}

/// Gemini omits call identifiers entirely; every extracted call gets a
/// fresh one so results can still be matched within the iteration.
fn synthesize_id() -> String {
    format!("gemini_{}", Uuid::new_v4().simple())
}

pub fn extract_text(raw: &Value) -> Option<String> {
    let parts = raw
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)?;

    let text: Vec<&str> = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join("\n"))
    }
}

pub fn usage(raw: &Value) -> TokenUsage {
    let usage = raw.get("usageMetadata");
    TokenUsage::new(
        usage
            .and_then(|u| u.get("promptTokenCount"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        usage
            .and_then(|u| u.get("candidatesTokenCount"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
    )
}
