use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::*;
use crate::application::catalog::ToolCatalog;
use crate::application::executor::{ToolBackend, ToolExecutor, ToolInvokeError, ToolOutput};
use crate::constants::FORMATTER_TOOL_NAME;
use crate::domain::structured::ConversationSegment;
use crate::domain::types::{MessageRole, ToolDefinition};
use crate::infrastructure::provider::adapter::{Dialect, ProviderAdapter};
use crate::infrastructure::provider::clients::ProviderClient;
use crate::infrastructure::provider::types::{ProviderError, ProviderRequest, ProviderTurn};

/// Provider stub that replays scripted raw responses and records every
/// request it sees.
struct ScriptedClient {
    dialect: Dialect,
    responses: Arc<Mutex<Vec<Value>>>,
    recordings: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl ScriptedClient {
    fn new(dialect: Dialect, responses: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            dialect,
            responses: Arc::new(Mutex::new(responses)),
            recordings: Arc::new(Mutex::new(Vec::new())),
        })
    }

    async fn requests(&self) -> Vec<ProviderRequest> {
        self.recordings.lock().await.clone()
    }
}

#[async_trait]
impl ProviderClient for ScriptedClient {
    fn id(&self) -> &str {
        "scripted"
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn send(&self, request: &ProviderRequest) -> Result<ProviderTurn, ProviderError> {
        self.recordings.lock().await.push(request.clone());
        let mut responses = self.responses.lock().await;
        assert!(!responses.is_empty(), "scripted client ran out of responses");
        let raw = responses.remove(0);
        let usage = ProviderAdapter::new(self.dialect).extract_usage(&raw);
        Ok(ProviderTurn { raw, usage })
    }
}

struct StubBackend {
    content: Value,
}

#[async_trait]
impl ToolBackend for StubBackend {
    async fn call_tool(&self, _name: &str, _args: Value) -> Result<ToolOutput, ToolInvokeError> {
        Ok(ToolOutput {
            content: self.content.clone(),
            is_error: false,
        })
    }
}

fn catalog() -> Arc<ToolCatalog> {
    let mut catalog = ToolCatalog::new();
    catalog
        .register(ToolDefinition::new(
            "lookup",
            "Gene symbol lookup",
            json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        ))
        .unwrap();
    catalog
        .register(ToolDefinition::new(
            "search",
            "Literature search",
            json!({"type": "object", "properties": {"term": {"type": "string"}}}),
        ))
        .unwrap();
    Arc::new(catalog)
}

/// Route orchestrator logs through the test harness; `RUST_LOG` controls
/// verbosity.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn orchestrator(client: Arc<ScriptedClient>, backend_content: Value) -> Orchestrator {
    init_tracing();
    let catalog = catalog();
    let executor = ToolExecutor::new(
        catalog.clone(),
        Arc::new(StubBackend {
            content: backend_content,
        }),
        Duration::from_secs(5),
    );
    Orchestrator::new(client, catalog, executor)
}

fn anthropic_text(text: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 10, "output_tokens": 5}
    })
}

fn anthropic_call(id: &str, name: &str, input: Value) -> Value {
    json!({
        "content": [{"type": "tool_use", "id": id, "name": name, "input": input}],
        "usage": {"input_tokens": 10, "output_tokens": 5}
    })
}

fn anthropic_formatted(conversation: Value) -> Value {
    json!({
        "content": [{
            "type": "tool_use",
            "id": "toolu_fmt",
            "name": FORMATTER_TOOL_NAME,
            "input": {"conversation": conversation}
        }],
        "usage": {"input_tokens": 10, "output_tokens": 5}
    })
}

#[tokio::test]
async fn completes_without_tools() {
    let client = ScriptedClient::new(
        Dialect::Anthropic,
        vec![
            anthropic_text("BRCA1 is a tumor suppressor gene."),
            anthropic_formatted(json!([{"type": "text", "content": "BRCA1 summary"}])),
        ],
    );
    let orchestrator = orchestrator(client.clone(), json!(null));

    let outcome = orchestrator
        .run("what is BRCA1?".into(), RunOptions::new("test-model"))
        .await
        .expect("run succeeds");

    assert_eq!(outcome.termination, Termination::Completed);
    assert!(outcome.steps.is_empty());
    assert!(matches!(
        &outcome.response.conversation[0],
        ConversationSegment::Text { content } if content == "BRCA1 summary"
    ));

    let requests = client.requests().await;
    assert_eq!(requests.len(), 2);
    // gathering turn: full catalog, nothing forced
    assert_eq!(requests[0].tools.len(), 2);
    assert!(requests[0].force_tool.is_none());
    // formatting turn: one-tool catalog, forced
    assert_eq!(requests[1].tools.len(), 1);
    assert_eq!(requests[1].force_tool.as_deref(), Some(FORMATTER_TOOL_NAME));
}

#[tokio::test]
async fn executes_single_lookup_and_feeds_result_back() {
    let client = ScriptedClient::new(
        Dialect::Anthropic,
        vec![
            anthropic_call("toolu_01", "lookup", json!({"query": "BRCA1"})),
            anthropic_text("Found it."),
            anthropic_formatted(json!([{"type": "text", "content": "done"}])),
        ],
    );
    let orchestrator = orchestrator(client.clone(), json!("found"));

    let outcome = orchestrator
        .run("look up BRCA1".into(), RunOptions::new("test-model"))
        .await
        .expect("run succeeds");

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].tool, "lookup");
    assert!(outcome.steps[0].success);

    // exactly one tool-role message, carrying the executor's content,
    // placed before the final assistant text
    let tool_messages: Vec<_> = outcome
        .conversation
        .iter()
        .filter(|m| m.role == MessageRole::Tool)
        .collect();
    assert_eq!(tool_messages.len(), 1);
    assert_eq!(tool_messages[0].content, "found");
    assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("toolu_01"));
    let tool_index = outcome
        .conversation
        .iter()
        .position(|m| m.role == MessageRole::Tool)
        .unwrap();
    assert_eq!(
        outcome.conversation.last().unwrap().role,
        MessageRole::Assistant
    );
    assert!(tool_index < outcome.conversation.len() - 1);

    // usage accumulated over three turns
    assert_eq!(outcome.usage.input_tokens, 30);
    assert_eq!(outcome.usage.output_tokens, 15);
}

#[tokio::test]
async fn repeated_call_aborts_on_second_occurrence() {
    let client = ScriptedClient::new(
        Dialect::Anthropic,
        vec![
            anthropic_call("toolu_01", "search", json!({"term": "x"})),
            anthropic_call("toolu_02", "search", json!({"term": "x"})),
            anthropic_formatted(json!([{"type": "text", "content": "partial"}])),
        ],
    );
    let orchestrator = orchestrator(client.clone(), json!("hits"));

    let outcome = orchestrator
        .run("search x".into(), RunOptions::new("test-model"))
        .await
        .expect("run terminates gracefully");

    // aborted on the second occurrence, not a third
    assert_eq!(
        outcome.termination,
        Termination::RepeatedToolCall {
            tool: "search".into()
        }
    );
    assert_eq!(outcome.steps.len(), 2);

    let requests = client.requests().await;
    assert_eq!(requests.len(), 3, "two gathering turns plus formatting");
    let format_request = &requests[2];
    let instruction = &format_request.messages.last().unwrap().content;
    assert!(instruction.contains("repeated tool call detected"));

    // partial results still reach the caller as a structured response
    assert!(!outcome.response.conversation.is_empty());
}

#[tokio::test]
async fn key_order_does_not_defeat_the_loop_guard() {
    // Same arguments, different key order: still a repeat.
    let client = ScriptedClient::new(
        Dialect::Anthropic,
        vec![
            anthropic_call("toolu_01", "search", json!({"term": "x", "limit": 5})),
            anthropic_call("toolu_02", "search", json!({"limit": 5, "term": "x"})),
            anthropic_formatted(json!([{"type": "text", "content": "partial"}])),
        ],
    );
    let orchestrator = orchestrator(client.clone(), json!("hits"));

    let outcome = orchestrator
        .run("search x".into(), RunOptions::new("test-model"))
        .await
        .expect("run terminates gracefully");
    assert!(matches!(
        outcome.termination,
        Termination::RepeatedToolCall { .. }
    ));
}

#[tokio::test]
async fn iteration_limit_stops_a_busy_model() {
    // Every turn asks for a different call, so only the cap can stop it.
    let client = ScriptedClient::new(
        Dialect::Anthropic,
        vec![
            anthropic_call("toolu_01", "search", json!({"term": "a"})),
            anthropic_call("toolu_02", "search", json!({"term": "b"})),
            anthropic_formatted(json!([{"type": "text", "content": "partial"}])),
        ],
    );
    let orchestrator = orchestrator(client.clone(), json!("hits"));

    let options = RunOptions::new("test-model").with_max_iterations(2);
    let outcome = orchestrator
        .run("search everything".into(), options)
        .await
        .expect("run terminates gracefully");

    assert_eq!(outcome.termination, Termination::IterationLimit);
    assert_eq!(outcome.steps.len(), 2, "step count stays within the cap");

    let requests = client.requests().await;
    assert_eq!(requests.len(), 3, "two gathering turns plus formatting");
    assert!(
        requests[2]
            .messages
            .last()
            .unwrap()
            .content
            .contains("iteration limit reached")
    );
}

#[tokio::test]
async fn gemini_formatting_routes_through_structured_output() {
    let structured = json!({
        "conversation": [{"type": "text", "content": "from gemini"}]
    });
    let client = ScriptedClient::new(
        Dialect::Gemini,
        vec![
            json!({
                "candidates": [{"content": {"parts": [{"text": "plain answer"}]}}],
                "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2}
            }),
            json!({
                "candidates": [{"content": {"parts": [{"text": structured.to_string()}]}}],
                "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2}
            }),
        ],
    );
    let orchestrator = orchestrator(client.clone(), json!(null));

    let outcome = orchestrator
        .run("hello".into(), RunOptions::new("gemini-pro"))
        .await
        .expect("run succeeds");

    // forced-tool path must not be taken on this dialect
    let requests = client.requests().await;
    let format_request = &requests[1];
    assert!(format_request.force_tool.is_none());
    assert!(format_request.response_schema.is_some());

    assert!(matches!(
        &outcome.response.conversation[0],
        ConversationSegment::Text { content } if content == "from gemini"
    ));
}

#[tokio::test]
async fn unparseable_formatter_payload_falls_back_to_raw_text() {
    let client = ScriptedClient::new(
        Dialect::Anthropic,
        vec![
            anthropic_text("the answer"),
            // model ignored the forced tool and returned prose
            anthropic_text("Here is your answer in plain words."),
        ],
    );
    let orchestrator = orchestrator(client.clone(), json!(null));

    let outcome = orchestrator
        .run("hello".into(), RunOptions::new("test-model"))
        .await
        .expect("run succeeds");

    assert_eq!(outcome.termination, Termination::Completed);
    assert!(matches!(
        &outcome.response.conversation[0],
        ConversationSegment::Text { content }
            if content == "Here is your answer in plain words."
    ));
}

#[tokio::test]
async fn unknown_tool_request_keeps_the_run_alive() {
    let client = ScriptedClient::new(
        Dialect::Anthropic,
        vec![
            anthropic_call("toolu_01", "nonexistent", json!({})),
            anthropic_text("I could not use that tool."),
            anthropic_formatted(json!([{"type": "text", "content": "sorry"}])),
        ],
    );
    let orchestrator = orchestrator(client.clone(), json!(null));

    let outcome = orchestrator
        .run("use a tool".into(), RunOptions::new("test-model"))
        .await
        .expect("run succeeds despite unknown tool");

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(outcome.steps.len(), 1);
    assert!(!outcome.steps[0].success);
    let tool_message = outcome
        .conversation
        .iter()
        .find(|m| m.role == MessageRole::Tool)
        .unwrap();
    assert!(tool_message.content.contains("unknown tool"));
}
