use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};

use super::base::{FragmentStream, Provider};
use super::configs::OpenAiProviderConfig;
use super::utils::{check_status, sse_data, SseLineBuffer};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::message::{Message, Role};

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()
            .map_err(|e| ProviderError::NotInitialized(e.to_string()))?;
        Ok(Self { client, config })
    }
}

/// Convert messages to the OpenAI chat format, prepending the system
/// instruction when one is supplied. Separators are dropped.
fn messages_to_openai_spec(messages: &[Message], system: Option<&str>) -> Vec<Value> {
    let mut spec = Vec::new();
    if let Some(system) = system {
        spec.push(json!({"role": "system", "content": system}));
    }
    for message in messages {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Separator => continue,
        };
        spec.push(json!({"role": role, "content": message.content}));
    }
    spec
}

/// Pull the delta text out of one streamed completion frame
fn chunk_content(frame: &Value) -> Option<&str> {
    frame
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|content| content.as_str())
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
        system: Option<&str>,
    ) -> ProviderResult<FragmentStream> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );
        let payload = json!({
            "model": model,
            "messages": messages_to_openai_spec(messages, system),
            "stream": true,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Stream(e.to_string()))?;
        let response = check_status(response).await?;

        let mut body = response.bytes_stream();
        Ok(Box::pin(try_stream! {
            let mut lines = SseLineBuffer::new();
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|e| ProviderError::Stream(e.to_string()))?;
                for line in lines.push(&chunk) {
                    let data = match sse_data(&line) {
                        Some(data) => data,
                        None => continue,
                    };
                    let frame: Value = match serde_json::from_str(data) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::debug!("Skipping unparseable stream frame: {}", e);
                            continue;
                        }
                    };
                    if let Some(content) = chunk_content(&frame) {
                        if !content.is_empty() {
                            yield content.to_string();
                        }
                    }
                }
            }
        }))
    }
}
