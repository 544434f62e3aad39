use std::env;

use crate::agents::Producer;
use crate::errors::{ProviderError, ProviderResult};

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com";
pub const GOOGLE_AI_HOST: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct AnthropicProviderConfig {
    pub host: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct GoogleProviderConfig {
    pub host: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
    Anthropic(AnthropicProviderConfig),
    Google(GoogleProviderConfig),
}

impl ProviderConfig {
    /// Build the config for a producer from its conventional environment
    /// variables. A missing key fails here, which surfaces as a per-agent
    /// error event rather than a process-level failure.
    pub fn from_env(producer: Producer) -> ProviderResult<Self> {
        match producer {
            Producer::OpenAi => Ok(ProviderConfig::OpenAi(OpenAiProviderConfig {
                host: host_from_env("OPENAI_HOST", OPENAI_HOST),
                api_key: require_env("OPENAI_API_KEY")?,
            })),
            Producer::Anthropic => Ok(ProviderConfig::Anthropic(AnthropicProviderConfig {
                host: host_from_env("ANTHROPIC_HOST", ANTHROPIC_HOST),
                api_key: require_env("ANTHROPIC_API_KEY")?,
            })),
            Producer::Google => Ok(ProviderConfig::Google(GoogleProviderConfig {
                host: host_from_env("GOOGLE_AI_HOST", GOOGLE_AI_HOST),
                api_key: require_env("GOOGLE_AI_API_KEY")?,
            })),
        }
    }
}

fn host_from_env(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn require_env(var: &str) -> ProviderResult<String> {
    env::var(var).map_err(|_| ProviderError::NotInitialized(format!("{} is not set", var)))
}
