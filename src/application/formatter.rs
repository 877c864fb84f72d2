//! The terminal formatting pass: one request that coerces the accumulated
//! conversation into the fixed structured-conversation schema, using the
//! strongest constraint mechanism each backend offers.

use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::agent::RunOptions;
use crate::constants::FORMATTER_TOOL_NAME;
use crate::domain::structured::StructuredResponse;
use crate::domain::types::{ChatMessage, TokenUsage, ToolDefinition};
use crate::infrastructure::provider::adapter::ProviderAdapter;
use crate::infrastructure::provider::adapters::recovery;
use crate::infrastructure::provider::clients::ProviderClient;
use crate::infrastructure::provider::types::{ProviderError, ProviderRequest};

/// A payload that failed validation against the structured-response
/// schema. Always recovered locally via the fallback response.
#[derive(Debug, Error)]
#[error("structured response violates schema: {0}")]
pub struct SchemaViolation(String);

/// JSON schema of the one tool offered during this pass.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "thinking": {
                "type": "string",
                "description": "Optional short reasoning summary."
            },
            "conversation": {
                "type": "array",
                "description": "Ordered answer segments.",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {"type": "string", "enum": ["text", "artifact"]},
                        "content": {"type": "string"},
                        "artifact": {
                            "type": "object",
                            "properties": {
                                "type": {"type": "string"},
                                "id": {"type": "string"},
                                "title": {"type": "string"},
                                "content": {"type": "string"},
                                "language": {"type": "string"}
                            },
                            "required": ["type", "id", "title", "content"]
                        }
                    },
                    "required": ["type"]
                }
            }
        },
        "required": ["conversation"]
    })
}

pub fn formatter_tool() -> ToolDefinition {
    ToolDefinition::new(
        FORMATTER_TOOL_NAME,
        "Emit the final answer as a structured conversation of text and artifact segments.",
        response_schema(),
    )
}

pub struct ResponseFormatter {
    client: Arc<dyn ProviderClient>,
    adapter: ProviderAdapter,
}

impl ResponseFormatter {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        let adapter = ProviderAdapter::new(client.dialect());
        Self { client, adapter }
    }

    /// Single shot: never iterates, never loses content. Transport errors
    /// propagate; every parse or schema failure degrades to a fallback
    /// response that preserves the raw text.
    pub async fn format(
        &self,
        conversation: &[ChatMessage],
        diagnostic: Option<String>,
        options: &RunOptions,
    ) -> Result<(StructuredResponse, TokenUsage), ProviderError> {
        let mut messages = conversation.to_vec();
        messages.push(ChatMessage::user(format_instruction(diagnostic.as_deref())));

        let mut request = ProviderRequest {
            model: options.model.clone(),
            temperature: options.temperature,
            max_output_tokens: options.max_output_tokens,
            messages,
            tools: Vec::new(),
            force_tool: None,
            response_schema: None,
        };

        // Branch before the request, not by retrying after failure: forced
        // tool choice where the backend honors it, native structured output
        // where forcing would come back malformed.
        if self.adapter.supports_forced_tool() {
            request.tools = vec![formatter_tool()];
            request.force_tool = Some(FORMATTER_TOOL_NAME.to_string());
        } else if self.adapter.supports_structured_output() {
            request.response_schema = Some(response_schema());
        } else {
            // Last message already carries the schema in its instruction.
        }

        info!(
            provider = self.client.id(),
            forced = request.force_tool.is_some(),
            structured = request.response_schema.is_some(),
            "Requesting formatted response"
        );
        let turn = self.client.send(&request).await?;

        let raw_text = self.adapter.extract_text(&turn.raw).unwrap_or_default();
        let payload = self.formatted_payload(&turn.raw, &raw_text);

        let response = match payload.map(parse_structured) {
            Some(Ok(response)) => response,
            Some(Err(violation)) => {
                warn!(%violation, "Formatted payload failed validation; preserving raw text");
                StructuredResponse::fallback(raw_text)
            }
            None => {
                warn!("No parseable formatted payload; preserving raw text");
                StructuredResponse::fallback(raw_text)
            }
        };

        Ok((response, turn.usage))
    }

    /// Locates the structured payload in the raw turn: the forced tool
    /// call's arguments where one was forced, otherwise JSON recovered
    /// from the text body.
    fn formatted_payload(&self, raw: &Value, raw_text: &str) -> Option<Value> {
        if self.adapter.supports_forced_tool() {
            let call = self
                .adapter
                .extract_calls(raw)
                .into_iter()
                .find(|call| call.name == FORMATTER_TOOL_NAME);
            if let Some(call) = call {
                debug!("Formatter tool call extracted");
                return Some(call.arguments);
            }
            // Some backends answer in plain text despite the directive.
        }
        recovery::extract_json(raw_text)
    }
}

fn format_instruction(diagnostic: Option<&str>) -> String {
    let mut instruction = String::from(
        "Produce the final answer for the user now as a single JSON object with an \
         optional \"thinking\" string and a \"conversation\" array of segments \
         ({\"type\":\"text\",\"content\":...} or {\"type\":\"artifact\",\"artifact\":{...}}). \
         The conversation field must be a literal JSON array. Do not call any other tool.",
    );
    if let Some(reason) = diagnostic {
        instruction.push_str(&format!(
            " Note: information gathering stopped early ({reason}); summarize what was found so far."
        ));
    }
    instruction
}

/// Validates and, where possible, repairs a candidate payload. Exactly two
/// malformed shapes are repaired: a string-encoded `conversation` array
/// and a `conversation` object nested under another `conversation` key.
fn parse_structured(payload: Value) -> Result<StructuredResponse, SchemaViolation> {
    let payload = match payload {
        Value::String(text) => recovery::extract_json(&text)
            .ok_or_else(|| SchemaViolation("payload is a non-JSON string".into()))?,
        other => other,
    };

    let Value::Object(mut map) = payload else {
        return Err(SchemaViolation("payload is not a JSON object".into()));
    };

    let conversation = map
        .remove("conversation")
        .ok_or_else(|| SchemaViolation("missing conversation array".into()))?;

    let conversation = match conversation {
        Value::Array(items) => Value::Array(items),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => Value::Array(items),
            _ => {
                return Err(SchemaViolation(
                    "conversation is a string, not an array".into(),
                ));
            }
        },
        Value::Object(inner) => match inner.get("conversation") {
            Some(Value::Array(items)) => Value::Array(items.clone()),
            _ => {
                return Err(SchemaViolation(
                    "conversation is nested without an inner array".into(),
                ));
            }
        },
        _ => return Err(SchemaViolation("conversation is not an array".into())),
    };

    map.insert("conversation".to_string(), conversation);
    serde_json::from_value(Value::Object(map))
        .map_err(|err| SchemaViolation(format!("segment validation failed: {err}")))
}
