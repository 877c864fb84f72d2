use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TEMPERATURE, DEFAULT_TOOL_TIMEOUT_SECS,
};

const DEFAULT_CONFIG_PATH: &str = "config/biochat.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no provider entry with id '{0}'")]
    UnknownProvider(String),
}

/// One LLM backend entry. `api_key` names an environment variable, never
/// the key itself.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub id: String,
    pub provider_type: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_path: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
}

/// Orchestration tuning knobs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub tool_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_provider: String,
    pub system_prompt: Option<String>,
    pub providers: Vec<ProviderConfig>,
    pub agent: AgentConfig,
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    default_provider: Option<String>,
    system_prompt: Option<String>,
    #[serde(default)]
    providers: Vec<ProviderConfig>,
    #[serde(default)]
    agent: AgentConfig,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let config = read_config(path)?;
        info!(
            path = %path.display(),
            providers = config.providers.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn provider(&self, id: &str) -> Result<&ProviderConfig, ConfigError> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ConfigError::UnknownProvider(id.to_string()))
    }

    pub fn default_provider(&self) -> Result<&ProviderConfig, ConfigError> {
        self.provider(&self.default_provider)
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Parsed raw configuration");

    let default_provider = raw
        .default_provider
        .or_else(|| raw.providers.first().map(|p| p.id.clone()))
        .unwrap_or_default();

    Ok(AppConfig {
        default_provider,
        system_prompt: raw.system_prompt,
        providers: raw.providers,
        agent: raw.agent,
    })
}
