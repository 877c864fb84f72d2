//! Multi-provider tool-calling orchestration core.
//!
//! Converts one internal tool catalog into each LLM backend's wire
//! dialect, drives a bounded gather/execute loop against the active
//! backend, and finishes with a format-constrained pass that coerces the
//! final answer into a fixed structured-conversation shape.

pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::agent::{Orchestrator, RunOptions, RunOutcome, Termination, ToolStep};
pub use application::catalog::{CatalogError, ToolCatalog};
pub use application::executor::{ToolBackend, ToolExecutor, ToolInvokeError, ToolOutput};
pub use application::formatter::{ResponseFormatter, SchemaViolation};
pub use config::{AppConfig, ConfigError, ProviderConfig};
pub use domain::structured::{Artifact, ConversationSegment, StructuredResponse};
pub use domain::types::{
    ChatMessage, MessageRole, NormalizedToolCall, TokenUsage, ToolDefinition, ToolResult,
};
pub use infrastructure::provider::{
    Dialect, ProviderAdapter, ProviderClient, ProviderError, ProviderFactory, ProviderRequest,
    ProviderTurn,
};
