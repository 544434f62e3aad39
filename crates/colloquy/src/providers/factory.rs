use super::anthropic::AnthropicProvider;
use super::base::Provider;
use super::configs::ProviderConfig;
use super::google::GoogleProvider;
use super::openai::OpenAiProvider;
use crate::agents::Agent;
use crate::errors::ProviderResult;

pub fn get_provider(config: ProviderConfig) -> ProviderResult<Box<dyn Provider + Send + Sync>> {
    match config {
        ProviderConfig::OpenAi(config) => Ok(Box::new(OpenAiProvider::new(config)?)),
        ProviderConfig::Anthropic(config) => Ok(Box::new(AnthropicProvider::new(config)?)),
        ProviderConfig::Google(config) => Ok(Box::new(GoogleProvider::new(config)?)),
    }
}

/// Resolves the provider client used to run one agent's completion
pub trait ProviderSource: Send + Sync {
    fn provider_for(&self, agent: &Agent) -> ProviderResult<Box<dyn Provider + Send + Sync>>;
}

/// Environment-backed source. Every call re-reads the producer's
/// environment variables, so credentials are picked up per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProviderSource;

impl ProviderSource for EnvProviderSource {
    fn provider_for(&self, agent: &Agent) -> ProviderResult<Box<dyn Provider + Send + Sync>> {
        get_provider(ProviderConfig::from_env(agent.producer)?)
    }
}
