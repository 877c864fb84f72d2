//! Executes normalized tool calls against the tool invocation boundary.
//!
//! Execution never fails at the type level: unknown tools, backend
//! errors, and timeouts all come back as error-flagged results so the
//! conversation loop can keep going and let the model react.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::catalog::ToolCatalog;
use crate::domain::types::{NormalizedToolCall, ToolResult};

/// What a wrapped domain server returns through the boundary.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: Value,
    pub is_error: bool,
}

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("tool '{tool}' transport error: {message}")]
    Transport { tool: String, message: String },
    #[error("tool '{tool}' returned invalid JSON: {source}")]
    InvalidJson {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tool '{tool}' call cancelled")]
    Cancelled { tool: String },
}

/// The only contract the orchestration core requires from the dozens of
/// domain wrapper servers.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolInvokeError>;
}

pub struct ToolExecutor {
    catalog: Arc<ToolCatalog>,
    backend: Arc<dyn ToolBackend>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(catalog: Arc<ToolCatalog>, backend: Arc<dyn ToolBackend>, timeout: Duration) -> Self {
        Self {
            catalog,
            backend,
            timeout,
        }
    }

    pub async fn execute(&self, call: &NormalizedToolCall) -> ToolResult {
        let Some(tool) = self.catalog.get(&call.name) else {
            warn!(requested_tool = %call.name, "Unknown tool requested by model");
            return ToolResult::error(
                call,
                format!("unknown tool '{}': not present in the catalog", call.name),
            );
        };

        let arguments = match call.arguments.clone() {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        debug!(tool = %tool.name, call_id = %call.id, "Dispatching tool call");
        let invocation = self.backend.call_tool(&tool.name, arguments);
        let result = match tokio::time::timeout(self.timeout, invocation).await {
            Ok(Ok(output)) => {
                if output.is_error {
                    ToolResult {
                        tool_call_id: call.id.clone(),
                        name: call.name.clone(),
                        content: output.content,
                        is_error: true,
                    }
                } else {
                    ToolResult::success(call, output.content)
                }
            }
            Ok(Err(source)) => {
                warn!(tool = %call.name, %source, "Tool execution failed");
                ToolResult::error(call, source.to_string())
            }
            Err(_) => {
                warn!(
                    tool = %call.name,
                    timeout_secs = self.timeout.as_secs(),
                    "Tool execution timed out"
                );
                ToolResult::error(
                    call,
                    format!(
                        "tool '{}' timed out after {}s",
                        call.name,
                        self.timeout.as_secs()
                    ),
                )
            }
        };

        info!(tool = %result.name, success = !result.is_error, "Tool executed");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubBackend {
        output: Result<ToolOutput, ToolInvokeError>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ToolBackend for StubBackend {
        async fn call_tool(
            &self,
            _name: &str,
            _arguments: Value,
        ) -> Result<ToolOutput, ToolInvokeError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.output {
                Ok(output) => Ok(output.clone()),
                Err(ToolInvokeError::Transport { tool, message }) => {
                    Err(ToolInvokeError::Transport {
                        tool: tool.clone(),
                        message: message.clone(),
                    })
                }
                Err(_) => unreachable!("stub only scripts transport errors"),
            }
        }
    }

    fn catalog() -> Arc<ToolCatalog> {
        let mut catalog = ToolCatalog::new();
        catalog
            .register(crate::domain::types::ToolDefinition::new(
                "lookup",
                "Gene lookup",
                json!({"type": "object"}),
            ))
            .unwrap();
        Arc::new(catalog)
    }

    fn executor(backend: StubBackend, timeout: Duration) -> ToolExecutor {
        ToolExecutor::new(catalog(), Arc::new(backend), timeout)
    }

    #[tokio::test]
    async fn successful_call_passes_content_through() {
        let exec = executor(
            StubBackend {
                output: Ok(ToolOutput {
                    content: json!("found"),
                    is_error: false,
                }),
                delay: None,
            },
            Duration::from_secs(5),
        );
        let call = NormalizedToolCall::new("1", "lookup", json!({"query": "BRCA1"}));
        let result = exec.execute(&call).await;
        assert!(!result.is_error);
        assert_eq!(result.tool_call_id, "1");
        assert_eq!(result.content_text(), "found");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_result_not_panic() {
        let exec = executor(
            StubBackend {
                output: Ok(ToolOutput {
                    content: json!(null),
                    is_error: false,
                }),
                delay: None,
            },
            Duration::from_secs(5),
        );
        let call = NormalizedToolCall::new("1", "does_not_exist", json!({}));
        let result = exec.execute(&call).await;
        assert!(result.is_error);
        assert!(result.content_text().contains("unknown tool"));
    }

    #[tokio::test]
    async fn backend_failure_is_recovered_locally() {
        let exec = executor(
            StubBackend {
                output: Err(ToolInvokeError::Transport {
                    tool: "lookup".into(),
                    message: "connection refused".into(),
                }),
                delay: None,
            },
            Duration::from_secs(5),
        );
        let call = NormalizedToolCall::new("1", "lookup", json!({}));
        let result = exec.execute(&call).await;
        assert!(result.is_error);
        assert!(result.content_text().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_instead_of_hanging() {
        let exec = executor(
            StubBackend {
                output: Ok(ToolOutput {
                    content: json!("late"),
                    is_error: false,
                }),
                delay: Some(Duration::from_secs(120)),
            },
            Duration::from_secs(1),
        );
        let call = NormalizedToolCall::new("1", "lookup", json!({}));
        let result = exec.execute(&call).await;
        assert!(result.is_error);
        assert!(result.content_text().contains("timed out"));
    }
}
