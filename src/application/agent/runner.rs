use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{IterationState, RunOptions, RunOutcome, Termination, ToolStep};
use crate::application::catalog::ToolCatalog;
use crate::application::executor::ToolExecutor;
use crate::application::formatter::ResponseFormatter;
use crate::domain::types::{ChatMessage, TokenUsage};
use crate::infrastructure::provider::adapter::ProviderAdapter;
use crate::infrastructure::provider::clients::ProviderClient;
use crate::infrastructure::provider::types::{ProviderError, ProviderRequest};

/// Drives one run: gather a model turn, execute any requested tools,
/// append results, repeat until the model stops asking or a guard trips,
/// then hand the conversation to the formatting pass.
pub struct Orchestrator {
    client: Arc<dyn ProviderClient>,
    adapter: ProviderAdapter,
    catalog: Arc<ToolCatalog>,
    executor: ToolExecutor,
    formatter: ResponseFormatter,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn ProviderClient>,
        catalog: Arc<ToolCatalog>,
        executor: ToolExecutor,
    ) -> Self {
        let adapter = ProviderAdapter::new(client.dialect());
        let formatter = ResponseFormatter::new(client.clone());
        Self {
            client,
            adapter,
            catalog,
            executor,
            formatter,
        }
    }

    pub async fn run(
        &self,
        prompt: String,
        options: RunOptions,
    ) -> Result<RunOutcome, ProviderError> {
        info!(
            provider = self.client.id(),
            model = options.model.as_str(),
            tools = self.catalog.len(),
            "Run started"
        );

        let mut conversation = Vec::new();
        if let Some(system) = &options.system_prompt {
            conversation.push(ChatMessage::system(system.clone()));
        }
        conversation.push(ChatMessage::user(prompt));

        let mut state = IterationState::new();
        let mut steps: Vec<ToolStep> = Vec::new();
        let mut usage = TokenUsage::default();

        let termination = loop {
            // GATHERING: the model chooses freely; no forced tool here.
            debug!(
                step = state.step_count,
                messages = conversation.len(),
                "Submitting gathering turn"
            );
            let request = ProviderRequest {
                model: options.model.clone(),
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
                messages: conversation.clone(),
                tools: self.catalog.list_all().to_vec(),
                force_tool: None,
                response_schema: None,
            };
            let turn = self.client.send(&request).await?;
            usage.add(turn.usage);

            let text = self.adapter.extract_text(&turn.raw).unwrap_or_default();
            let calls = self.adapter.extract_calls(&turn.raw);

            if calls.is_empty() {
                conversation.push(ChatMessage::assistant(text));
                break Termination::Completed;
            }

            // EXECUTING_TOOLS: sequential, in extraction order; downstream
            // services are rate limited, so no intra-iteration parallelism.
            conversation.push(ChatMessage::assistant_with_calls(text, calls.clone()));
            let mut repeated: Option<String> = None;
            for call in &calls {
                info!(tool = %call.name, call_id = %call.id, "Model requested tool");
                let result = self.executor.execute(call).await;
                steps.push(ToolStep::record(call, &result));
                conversation.push(ChatMessage::tool_result(&result));

                if !state.record_signature(call.signature()) && repeated.is_none() {
                    repeated = Some(call.name.clone());
                }
            }
            state.step_count += 1;

            if let Some(tool) = repeated {
                warn!(tool = %tool, "Repeated tool call detected; aborting run");
                break Termination::RepeatedToolCall { tool };
            }
            if state.step_count >= options.max_iterations {
                warn!(
                    max_iterations = options.max_iterations,
                    "Iteration limit reached; aborting run"
                );
                break Termination::IterationLimit;
            }
        };

        info!(
            aborted = termination.is_aborted(),
            steps = steps.len(),
            total_tokens = usage.total(),
            "Gathering finished; formatting final response"
        );

        let (response, format_usage) = self
            .formatter
            .format(&conversation, termination.diagnostic(), &options)
            .await?;
        usage.add(format_usage);

        Ok(RunOutcome {
            response,
            conversation,
            steps,
            termination,
            usage,
        })
    }
}
