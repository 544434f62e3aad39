use reqwest::{Response, StatusCode};

use crate::errors::{ProviderError, ProviderResult};

/// Buffers raw response bytes and splits out complete lines. Splitting is
/// done at the byte level so a UTF-8 code point torn across two network
/// chunks is reassembled before decoding.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&raw).trim_end().to_string());
        }
        lines
    }
}

/// Extract the payload of an SSE `data:` line. Returns `None` for other
/// line types, keep-alives, and the `[DONE]` sentinel.
pub fn sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data: ")?.trim();
    if data.is_empty() || data == "[DONE]" {
        None
    } else {
        Some(data)
    }
}

/// Convert a non-success status into a provider error: 429 and 5xx report
/// as server errors, other statuses as request failures carrying the
/// response body.
pub async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(ProviderError::Server(status.to_string()));
    }
    let text = response
        .text()
        .await
        .map_err(|e| ProviderError::Stream(e.to_string()))?;
    Err(ProviderError::RequestFailed(status.to_string(), text))
}
