use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::constants::{DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use crate::domain::structured::StructuredResponse;
use crate::domain::types::{ChatMessage, NormalizedToolCall, TokenUsage, ToolResult};

/// Per-run tuning. The system prompt is an opaque caller-supplied string.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_iterations: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl RunOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }
}

/// Why the gather/execute loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Termination {
    /// The model answered without requesting further tools.
    Completed,
    /// The same call signature came back a second time.
    RepeatedToolCall { tool: String },
    /// The configured iteration cap was hit.
    IterationLimit,
}

impl Termination {
    pub fn is_aborted(&self) -> bool {
        !matches!(self, Termination::Completed)
    }

    /// Diagnostic attached to the formatting pass for aborted runs.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Termination::Completed => None,
            Termination::RepeatedToolCall { tool } => Some(format!(
                "repeated tool call detected: '{tool}' was invoked twice with identical arguments"
            )),
            Termination::IterationLimit => Some("iteration limit reached".to_string()),
        }
    }
}

/// One executed tool call, kept for diagnostics and the caller's audit
/// trail.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStep {
    pub call_id: String,
    pub tool: String,
    pub input: Value,
    pub success: bool,
    pub output: Value,
}

impl ToolStep {
    pub(crate) fn record(call: &NormalizedToolCall, result: &ToolResult) -> Self {
        Self {
            call_id: call.id.clone(),
            tool: call.name.clone(),
            input: call.arguments.clone(),
            success: !result.is_error,
            output: result.content.clone(),
        }
    }
}

/// Everything a finished run hands back. Even aborted runs carry a
/// schema-valid structured response built from the partial conversation.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub response: StructuredResponse,
    pub conversation: Vec<ChatMessage>,
    pub steps: Vec<ToolStep>,
    pub termination: Termination,
    pub usage: TokenUsage,
}

/// Loop bookkeeping owned exclusively by the orchestrator; created per run
/// and dropped at loop exit.
#[derive(Debug, Default)]
pub(crate) struct IterationState {
    pub step_count: usize,
    pub seen_signatures: HashSet<u64>,
}

impl IterationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a signature; false means it was already seen this run.
    pub fn record_signature(&mut self, signature: u64) -> bool {
        self.seen_signatures.insert(signature)
    }
}
