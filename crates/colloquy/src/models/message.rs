use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Separator,
}

fn timestamp() -> i64 {
    Utc::now().timestamp()
}

/// A single turn in a conversation. Assistant turns carry the id and
/// display name of the agent that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default = "timestamp")]
    pub created: i64,
    pub content: String,
    #[serde(rename = "agentId", default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(rename = "agentName", default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            created: timestamp(),
            content: content.into(),
            agent_id: None,
            agent_name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn separator(content: impl Into<String>) -> Self {
        Self::new(Role::Separator, content)
    }

    /// Tag the message with the agent that produced it
    pub fn with_agent(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.agent_id = Some(id.into());
        self.agent_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_builders() {
        let message = Message::user("What is the capital of France?");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "What is the capital of France?");
        assert!(message.agent_id.is_none());

        let message = Message::assistant("Paris.").with_agent("gpt-4.1", "GPT-4.1");
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.agent_id.as_deref(), Some("gpt-4.1"));
        assert_eq!(message.agent_name.as_deref(), Some("GPT-4.1"));
    }

    #[test]
    fn test_message_serialization_uses_camel_case_tags() {
        let message = Message::assistant("Paris.").with_agent("gpt-4.1", "GPT-4.1");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["agentId"], "gpt-4.1");
        assert_eq!(value["agentName"], "GPT-4.1");

        let plain = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(plain.get("agentId").is_none());
        assert!(plain.get("agentName").is_none());
    }

    #[test]
    fn test_message_deserializes_without_created() {
        let message: Message = serde_json::from_value(json!({
            "role": "user",
            "content": "hello",
        }))
        .unwrap();
        assert_eq!(message.role, Role::User);
        assert!(message.created > 0);
    }

    #[test]
    fn test_separator_round_trip() {
        let message = Message::separator("-- Comparison Analysis --");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "separator");
        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back.role, Role::Separator);
    }
}
