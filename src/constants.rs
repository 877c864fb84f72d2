//! Process-wide defaults and wire constants.

/// Hard cap on gather/execute iterations per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Per-tool-call execution timeout in seconds.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
/// Outbound provider request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Name of the single tool offered during the formatting pass.
pub const FORMATTER_TOOL_NAME: &str = "respond_formatted";

pub const DEFAULT_ANTHROPIC_API_PATH: &str = "/v1/messages";
pub const DEFAULT_OPENAI_API_PATH: &str = "/v1/chat/completions";
pub const DEFAULT_GEMINI_API_PATH: &str = "/v1beta/models";
pub const DEFAULT_OLLAMA_API_PATH: &str = "/api/chat";

pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Bounded retry schedule applied only to hard rate-limit responses.
pub const RATE_LIMIT_MAX_ATTEMPTS: u32 = 3;
pub const RATE_LIMIT_BASE_DELAY_MS: u64 = 500;
pub const RATE_LIMIT_MAX_DELAY_MS: u64 = 8_000;
