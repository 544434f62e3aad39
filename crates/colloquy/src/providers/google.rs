use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};

use super::base::{FragmentStream, Provider};
use super::configs::GoogleProviderConfig;
use super::utils::{check_status, sse_data, SseLineBuffer};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::message::{Message, Role};

pub struct GoogleProvider {
    client: Client,
    config: GoogleProviderConfig,
}

impl GoogleProvider {
    pub fn new(config: GoogleProviderConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()
            .map_err(|e| ProviderError::NotInitialized(e.to_string()))?;
        Ok(Self { client, config })
    }
}

/// Convert messages to the Gemini contents format. Only user and assistant
/// turns are sent; the assistant role is renamed to `model`.
fn messages_to_gemini_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant))
        .map(|m| {
            let role = if m.role == Role::User { "user" } else { "model" };
            json!({"role": role, "parts": [{"text": m.content}]})
        })
        .collect()
}

/// Concatenate the text parts of one streamed generation frame
fn frame_text(frame: &Value) -> Option<String> {
    let parts = frame
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
        system: Option<&str>,
    ) -> ProviderResult<FragmentStream> {
        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            self.config.host.trim_end_matches('/'),
            model,
            self.config.api_key
        );
        let mut payload = json!({
            "contents": messages_to_gemini_spec(messages),
        });
        if let Some(system) = system {
            if let Some(object) = payload.as_object_mut() {
                object.insert(
                    "systemInstruction".to_string(),
                    json!({"parts": [{"text": system}]}),
                );
            }
        }

        let response = self
            .client
            .post(&url)
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
                    if let Some(text) = frame_text(&frame) {
                        yield text;
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(status: u16, body: &str) -> (MockServer, GoogleProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gemini-2.5-pro-exp-03-25:streamGenerateContent"))
            .and(query_param("alt", "sse"))
            .and(query_param("key", "test_key"))
            .respond_with(
                ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), "text/event-stream"),
            )
            .mount(&mock_server)
            .await;

        let provider = GoogleProvider::new(GoogleProviderConfig {
            host: mock_server.uri(),
            api_key: "test_key".to_string(),
        })
        .unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_stream_chat_yields_candidate_parts() {
        let sse = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"The capital \"}],\"role\":\"model\"}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"is \"},{\"text\":\"Paris.\"}],\"role\":\"model\"}}]}\n\n",
        );
        let (_mock_server, provider) = setup_mock_server(200, sse).await;

        let stream = provider
            .stream_chat(
                "gemini-2.5-pro-exp-03-25",
                &[Message::user("What is the capital of France?")],
                None,
            )
            .await
            .unwrap();
        let fragments: Vec<String> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<ProviderResult<_>>()
            .unwrap();
        assert_eq!(fragments, vec!["The capital ", "is Paris."]);
    }

    #[tokio::test]
    async fn test_request_remaps_roles_and_sets_system_instruction() {
        let (mock_server, provider) = setup_mock_server(200, "").await;

        let messages = vec![
            Message::system("dropped inline"),
            Message::user("first question"),
            Message::assistant("first answer").with_agent("gemini-2.5-pro", "Gemini 2.5 Pro"),
            Message::user("second question"),
        ];
        let stream = provider
            .stream_chat("gemini-2.5-pro-exp-03-25", &messages, Some("Be brief."))
            .await
            .unwrap();
        let _: Vec<_> = stream.collect().await;

        let requests = mock_server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(body["contents"][1]["parts"][0]["text"], "first answer");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let (_mock_server, provider) = setup_mock_server(503, "unavailable").await;

        let error = provider
            .stream_chat("gemini-2.5-pro-exp-03-25", &[Message::user("hi")], None)
            .await
            .err()
            .unwrap();
        assert!(matches!(error, ProviderError::Server(_)));
    }
}
