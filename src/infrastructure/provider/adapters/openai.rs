//! OpenAI chat-completions dialect: declarations wrapped as
//! `{type:"function", function:{...}}`, calls in a dedicated `tool_calls`
//! array with string-encoded arguments, results as `role:"tool"` messages.

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
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema,
                }
            })
        })
        .collect()
}

pub fn render(messages: &[ChatMessage]) -> RenderedMessages {
    let rendered: Vec<Value> = messages
        .iter()
        .map(|message| match message.role {
            MessageRole::System | MessageRole::User => json!({
                "role": message.role.as_str(),
                "content": message.content,
            }),
            MessageRole::Assistant => {
                if message.tool_calls.is_empty() {
                    json!({"role": "assistant", "content": message.content})
                } else {
                    let calls: Vec<Value> = message
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    let content = if message.content.is_empty() {
                        Value::Null
                    } else {
                        Value::String(message.content.clone())
                    };
                    json!({"role": "assistant", "content": content, "tool_calls": calls})
                }
            }
            MessageRole::Tool => json!({
                "role": "tool",
                "tool_call_id": message.tool_call_id,
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
    let message = raw
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"));
    let Some(message) = message else {
        warn!("openai response has no choices[0].message; treating as no tool calls");
        return Vec::new();
    };

    let Some(calls) = message.get("tool_calls").and_then(Value::as_array) else {
        return Vec::new();
    };

    calls
        .iter()
        .filter_map(|call| {
            let function = call.get("function")?;
            let Some(name) = function.get("name").and_then(Value::as_str) else {
                warn!("tool_calls entry missing function.name; skipping");
                return None;
            };
            let id = call
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
            let arguments = parse_arguments(function.get("arguments"));
            Some(NormalizedToolCall::new(id, name, arguments))
        })
        .collect()
}

/// Arguments arrive as a JSON-encoded string; tolerate an already-decoded
/// object as some compatible gateways send one.
fn parse_arguments(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::String(text)) => serde_json::from_str(text).unwrap_or_else(|err| {
            warn!(%err, "tool call arguments are not valid JSON; wrapping raw text");
            json!({"raw": text})
        }),
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => json!({}),
    }
}

pub fn extract_text(raw: &Value) -> Option<String> {
    raw.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn usage(raw: &Value) -> TokenUsage {
    let usage = raw.get("usage");
    TokenUsage::new(
        usage
            .and_then(|u| u.get("prompt_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        usage
            .and_then(|u| u.get("completion_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
    )
}

pub fn force_directive(name: &str) -> Value {
    json!({"type": "function", "function": {"name": name}})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_wrap_function_envelope() {
        let tools = vec![ToolDefinition::new(
            "lookup",
            "Gene symbol lookup",
            json!({"type": "object"}),
        )];
        let decls = declarations(&tools);
        assert_eq!(decls[0]["type"], "function");
        assert_eq!(decls[0]["function"]["name"], "lookup");
        assert_eq!(decls[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn round_trips_encoded_calls() {
        let raw = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "lookup",
                            "arguments": "{\"query\":\"BRCA1\"}"
                        }
                    }]
                }
            }],
            "usage": {"prompt_tokens": 7, "completion_tokens": 3}
        });

        let calls = extract_calls(&raw);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].name, "lookup");
        assert_eq!(calls[0].arguments, json!({"query": "BRCA1"}));
        assert_eq!(usage(&raw), TokenUsage::new(7, 3));
    }

    #[test]
    fn unparseable_arguments_are_wrapped_not_dropped() {
        let raw = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_1",
                        "function": {"name": "lookup", "arguments": "{not json"}
                    }]
                }
            }]
        });
        let calls = extract_calls(&raw);
        assert_eq!(calls[0].arguments, json!({"raw": "{not json"}));
    }

    #[test]
    fn malformed_payload_yields_no_calls() {
        assert!(extract_calls(&json!({"choices": []})).is_empty());
        assert!(extract_calls(&json!(42)).is_empty());
    }

    #[test]
    fn tool_results_render_with_call_id() {
        let call = NormalizedToolCall::new("call_1", "lookup", json!({"query": "BRCA1"}));
        let result = crate::domain::types::ToolResult::success(&call, json!("found"));
        let conversation = vec![
            ChatMessage::assistant_with_calls("", vec![call]),
            ChatMessage::tool_result(&result),
        ];
        let rendered = render(&conversation);
        let messages = rendered.messages.as_array().unwrap();
        assert_eq!(messages[0]["tool_calls"][0]["function"]["name"], "lookup");
        assert_eq!(messages[1]["role"], "tool");
        assert_eq!(messages[1]["tool_call_id"], "call_1");
        assert_eq!(messages[1]["content"], "found");
    }
}
