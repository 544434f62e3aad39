use std::fmt;

use serde::{Deserialize, Serialize};

/// One increment of an agent's response as it crosses the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Chunk { content: String },
    End,
    Error { error: String },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End | StreamEvent::Error { .. })
    }
}

/// Identifies one transcript within a multiplexed stream. The same agent id
/// reappears under different display names across phases, so the pair is
/// the key, not the id alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamKey {
    #[serde(rename = "agentId")]
    pub agent_id: String,
    #[serde(rename = "agentName")]
    pub agent_name: String,
}

impl StreamKey {
    pub fn new(agent_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        StreamKey {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.agent_id, self.agent_name)
    }
}

/// A stream event tagged with the transcript it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedEvent {
    #[serde(flatten)]
    pub key: StreamKey,
    #[serde(flatten)]
    pub event: StreamEvent,
}

impl TaggedEvent {
    pub fn chunk(key: StreamKey, content: impl Into<String>) -> Self {
        TaggedEvent {
            key,
            event: StreamEvent::Chunk {
                content: content.into(),
            },
        }
    }

    pub fn end(key: StreamKey) -> Self {
        TaggedEvent {
            key,
            event: StreamEvent::End,
        }
    }

    pub fn error(key: StreamKey, error: impl Into<String>) -> Self {
        TaggedEvent {
            key,
            event: StreamEvent::Error {
                error: error.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_wire_shape() {
        let chunk = StreamEvent::Chunk {
            content: "Par".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&chunk).unwrap(),
            r#"{"type":"chunk","content":"Par"}"#
        );
        assert_eq!(serde_json::to_string(&StreamEvent::End).unwrap(), r#"{"type":"end"}"#);

        let error = StreamEvent::Error {
            error: "quota exceeded".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"type":"error","error":"quota exceeded"}"#
        );
    }

    #[test]
    fn test_tagged_event_flattens_key_and_payload() {
        let key = StreamKey::new("gpt-4.1", "GPT-4.1 (Analysis)");
        let value = serde_json::to_value(TaggedEvent::chunk(key.clone(), "| Feature |")).unwrap();
        assert_eq!(value["type"], "chunk");
        assert_eq!(value["agentId"], "gpt-4.1");
        assert_eq!(value["agentName"], "GPT-4.1 (Analysis)");
        assert_eq!(value["content"], "| Feature |");

        let back: TaggedEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back.key, key);
        assert!(!back.event.is_terminal());
    }

    #[test]
    fn test_tagged_event_decodes_explicit_nulls() {
        // Some producers serialize unused fields as null rather than
        // omitting them; the decoder accepts both shapes.
        let line = r#"{"agentId":"claude-3.7","agentName":"Claude 3.7","type":"end","content":null,"error":null}"#;
        let event: TaggedEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.event, StreamEvent::End);
        assert_eq!(event.key.agent_id, "claude-3.7");
    }

    #[test]
    fn test_terminal_classification() {
        assert!(StreamEvent::End.is_terminal());
        assert!(StreamEvent::Error {
            error: "boom".to_string()
        }
        .is_terminal());
        assert!(!StreamEvent::Chunk {
            content: String::new()
        }
        .is_terminal());
    }
}
