use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};

use super::base::{FragmentStream, Provider};
use super::configs::AnthropicProviderConfig;
use super::utils::{check_status, sse_data, SseLineBuffer};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::message::{Message, Role};

pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Upper bound on generated tokens per completion
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()
            .map_err(|e| ProviderError::NotInitialized(e.to_string()))?;
        Ok(Self { client, config })
    }
}

/// Convert messages to the Anthropic messages format. System turns are
/// hoisted into the top-level `system` field, separators are dropped.
fn messages_to_anthropic_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant))
        .map(|m| {
            let role = if m.role == Role::User { "user" } else { "assistant" };
            json!({"role": role, "content": m.content})
        })
        .collect()
}

/// The explicit instruction wins over an inline system turn
fn system_instruction(messages: &[Message], system: Option<&str>) -> Option<String> {
    system.map(str::to_string).or_else(|| {
        messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone())
    })
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
        system: Option<&str>,
    ) -> ProviderResult<FragmentStream> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));
        let mut payload = json!({
            "model": model,
            "messages": messages_to_anthropic_spec(messages),
            "max_tokens": MAX_TOKENS,
            "stream": true,
        });
        if let Some(system) = system_instruction(messages, system) {
            if let Some(object) = payload.as_object_mut() {
                object.insert("system".to_string(), json!(system));
            }
        }

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Stream(e.to_string()))?;
        let response = check_status(response).await?;

        let mut body = response.bytes_stream();
        Ok(Box::pin(try_stream! {
            let mut lines = SseLineBuffer::new();
            'read: while let Some(chunk) = body.next().await {
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
                    match frame.get("type").and_then(|t| t.as_str()) {
                        Some("content_block_delta") => {
                            let delta = frame.get("delta");
                            let is_text = delta
                                .and_then(|d| d.get("type"))
                                .and_then(|t| t.as_str())
                                == Some("text_delta");
                            if is_text {
                                if let Some(text) =
                                    delta.and_then(|d| d.get("text")).and_then(|t| t.as_str())
                                {
                                    yield text.to_string();
                                }
                            }
                        }
                        Some("message_stop") => break 'read,
                        _ => {}
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(status: u16, body: &str) -> (MockServer, AnthropicProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test_key"))
            .and(header("anthropic-version", ANTHROPIC_API_VERSION))
            .respond_with(
                ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "text/event-stream"),
            )
            .mount(&mock_server)
            .await;

        let provider = AnthropicProvider::new(AnthropicProviderConfig {
            host: mock_server.uri(),
            api_key: "test_key".to_string(),
        })
        .unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_stream_chat_yields_text_deltas_until_message_stop() {
        let sse = concat!(
            "event: message_start\n",
            "data: {\"type\":\"message_start\"}\n\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Paris\"}}\n\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" is the capital.\"}}\n\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        let (_mock_server, provider) = setup_mock_server(200, sse).await;

        let stream = provider
            .stream_chat("claude-3-7-sonnet-latest", &[Message::user("hi")], None)
            .await
            .unwrap();
        let fragments: Vec<String> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<ProviderResult<_>>()
            .unwrap();
        assert_eq!(fragments, vec!["Paris", " is the capital."]);
    }

    #[tokio::test]
    async fn test_request_hoists_system_and_caps_tokens() {
        let (mock_server, provider) = setup_mock_server(200, "data: {\"type\":\"message_stop\"}\n\n").await;

        let messages = vec![
            Message::system("You are a judge."),
            Message::user("Compare these."),
        ];
        let stream = provider
            .stream_chat("claude-3-7-sonnet-latest", &messages, None)
            .await
            .unwrap();
        let _: Vec<_> = stream.collect().await;

        let requests = mock_server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["system"], "You are a judge.");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["stream"], true);
        let roles: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user"]);
    }

    #[tokio::test]
    async fn test_explicit_system_wins_over_inline() {
        let (mock_server, provider) = setup_mock_server(200, "data: {\"type\":\"message_stop\"}\n\n").await;

        let messages = vec![Message::system("inline"), Message::user("hi")];
        let stream = provider
            .stream_chat("claude-3-7-sonnet-latest", &messages, Some("explicit"))
            .await
            .unwrap();
        let _: Vec<_> = stream.collect().await;

        let requests = mock_server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["system"], "explicit");
    }

    #[tokio::test]
    async fn test_server_error_on_overload() {
        let (_mock_server, provider) = setup_mock_server(529, "overloaded").await;

        let error = provider
            .stream_chat("claude-3-7-sonnet-latest", &[Message::user("hi")], None)
            .await
            .err()
            .unwrap();
        assert!(matches!(error, ProviderError::Server(_)));
    }
}
