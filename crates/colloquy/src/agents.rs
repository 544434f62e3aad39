use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Reserved agent id for the second-stage table summarizer
pub const SUMMARIZER_AGENT_ID: &str = "summarizer";

/// Upstream vendor an agent's model is served by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Producer {
    OpenAi,
    Anthropic,
    Google,
}

/// A selectable model with its display identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub producer: Producer,
    pub model: String,
    pub description: String,
}

impl Agent {
    pub fn new(
        producer: Producer,
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Agent {
            id: id.into(),
            name: name.into(),
            producer,
            model: model.into(),
            description: description.into(),
        }
    }

    pub fn is_summarizer(&self) -> bool {
        self.id == SUMMARIZER_AGENT_ID
    }
}

/// The static agent registry. Ids are unique; lookups are by id.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        AgentRegistry::new(vec![
            Agent::new(
                Producer::OpenAi,
                "o3",
                "o3",
                "o3",
                "Advanced thinking language model by OpenAI.",
            ),
            Agent::new(
                Producer::OpenAi,
                "gpt-4.1",
                "GPT-4.1",
                "gpt-4.1",
                "Advanced language model by OpenAI.",
            ),
            Agent::new(
                Producer::Anthropic,
                "claude-3.7",
                "Claude 3.7",
                "claude-3-7-sonnet-latest",
                "Advanced thinking language model by Anthropic.",
            ),
            Agent::new(
                Producer::Google,
                "gemini-2.5-pro",
                "Gemini 2.5 Pro",
                "gemini-2.5-pro-exp-03-25",
                "Advanced thinking language model by Google.",
            ),
            Agent::new(
                Producer::OpenAi,
                SUMMARIZER_AGENT_ID,
                "Summary Agent",
                "gpt-4.1-mini",
                "Summarizes and tabulates comparison results.",
            ),
        ])
    }
}

impl AgentRegistry {
    pub fn new(agents: Vec<Agent>) -> Self {
        AgentRegistry { agents }
    }

    pub fn find(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn summarizer(&self) -> Option<&Agent> {
        self.find(SUMMARIZER_AGENT_ID)
    }

    /// Agents a user can pick for the first stage, i.e. everything except
    /// the summarizer.
    pub fn selectable(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|agent| !agent.is_summarizer())
    }

    pub fn all(&self) -> &[Agent] {
        &self.agents
    }
}
