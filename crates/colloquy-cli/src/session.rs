use anyhow::{anyhow, Context, Result};
use async_stream::try_stream;
use cliclack::{input, spinner};
use futures::StreamExt;
use reqwest::Client;
use serde_json::json;

use colloquy::accumulator::{Accumulator, Transcript, TranscriptState};
use colloquy::agents::Agent;
use colloquy::errors::ProviderError;
use colloquy::models::event::{StreamEvent, StreamKey, TaggedEvent};
use colloquy::models::message::Message;
use colloquy::mux::{Multiplexer, EVENT_BUFFER};
use colloquy::providers::base::FragmentStream;
use colloquy::providers::utils::check_status;
use colloquy::wire::LineDecoder;

use crate::render;

pub struct Session {
    host: String,
    client: Client,
    agents: Vec<Agent>,
    history: Vec<Message>,
}

/// Fetch the server's agent registry and fix the set of answering agents,
/// either from explicit ids or through an interactive picker.
pub async fn build_session(host: String, agent_ids: Vec<String>) -> Result<Session> {
    let host = host.trim_end_matches('/').to_string();
    let client = Client::new();

    let registry: Vec<Agent> = client
        .get(format!("{}/api/agents", host))
        .send()
        .await
        .with_context(|| format!("Could not reach colloquyd at {}", host))?
        .error_for_status()?
        .json()
        .await?;

    let agents = if agent_ids.is_empty() {
        pick_agents(&registry)?
    } else {
        resolve_agents(&registry, &agent_ids)?
    };

    Ok(Session {
        host,
        client,
        agents,
        history: Vec::new(),
    })
}

fn resolve_agents(registry: &[Agent], ids: &[String]) -> Result<Vec<Agent>> {
    ids.iter()
        .map(|id| {
            registry
                .iter()
                .find(|agent| &agent.id == id && !agent.is_summarizer())
                .cloned()
                .ok_or_else(|| anyhow!("Unknown agent id: {}", id))
        })
        .collect()
}

fn pick_agents(registry: &[Agent]) -> Result<Vec<Agent>> {
    let items: Vec<(String, &str, &str)> = registry
        .iter()
        .filter(|agent| !agent.is_summarizer())
        .map(|agent| {
            (
                agent.id.clone(),
                agent.name.as_str(),
                agent.description.as_str(),
            )
        })
        .collect();
    let chosen: Vec<String> = cliclack::multiselect("Which agents should answer?")
        .items(&items)
        .interact()?;

    Ok(registry
        .iter()
        .filter(|agent| chosen.contains(&agent.id))
        .cloned()
        .collect())
}

impl Session {
    pub async fn start(&mut self) -> Result<()> {
        cliclack::intro(console::style(" colloquy ").on_cyan().black())?;
        render::agent_roster(&self.agents);

        loop {
            let message_text: String = input("Message: (\"/exit\" to end)")
                .placeholder("")
                .multiline()
                .interact()?;
            let message_text = message_text.trim().to_string();

            if message_text.is_empty() {
                continue;
            }
            if message_text.eq_ignore_ascii_case("/exit")
                || message_text.eq_ignore_ascii_case("/quit")
            {
                break;
            }

            let (user_message, answered) = self.run_turn(message_text).await?;
            if answered.len() >= 2
                && cliclack::confirm("Run the comparison analysis?").interact()?
            {
                self.compare_pass(&user_message, &answered).await?;
            }
        }
        Ok(())
    }

    /// One-shot mode: a single turn that runs the comparison unprompted
    /// when at least two agents answer.
    pub async fn headless_start(&mut self, prompt: String) -> Result<()> {
        let (user_message, answered) = self.run_turn(prompt).await?;
        if answered.len() >= 2 {
            self.compare_pass(&user_message, &answered).await?;
        }
        Ok(())
    }

    /// One round: fan the new user message out to every answering agent and
    /// render the answers as they finish. Hands back the user message and
    /// the clean answers so the caller can decide on a comparison pass.
    async fn run_turn(&mut self, content: String) -> Result<(Message, Vec<Message>)> {
        let user_message = Message::user(content);
        self.history.push(user_message.clone());

        let spin = spinner();
        spin.start(format!("Querying {} agents", self.agents.len()));

        let (mut mux, mut events) = Multiplexer::channel(EVENT_BUFFER);
        for agent in &self.agents {
            let key = StreamKey::new(agent.id.clone(), agent.name.clone());
            mux.spawn(
                key,
                answer_stream(
                    self.client.clone(),
                    self.host.clone(),
                    self.history.clone(),
                    agent.id.clone(),
                ),
            );
        }

        let mut accumulator = Accumulator::new();
        let drain = async {
            while let Some(event) = events.next().await {
                fold_event(&mut accumulator, &event);
            }
        };
        tokio::join!(drain, mux.join());
        spin.stop("");

        for transcript in accumulator.transcripts() {
            if transcript.state == TranscriptState::Open {
                render::agent_failure(
                    &transcript.key.agent_name,
                    "Stream ended unexpectedly.",
                    &transcript.text,
                );
            }
        }

        let answered: Vec<Message> = accumulator
            .completed()
            .map(|transcript| {
                Message::assistant(transcript.text.clone()).with_agent(
                    transcript.key.agent_id.clone(),
                    transcript.key.agent_name.clone(),
                )
            })
            .collect();
        self.history.extend(answered.iter().cloned());

        Ok((user_message, answered))
    }

    async fn compare_pass(&mut self, user_query: &Message, responses: &[Message]) -> Result<()> {
        self.history.push(
            Message::separator("-- Comparison Analysis --").with_agent("separator-1", "Separator"),
        );
        render::section("-- Comparison Analysis --");

        let spin = spinner();
        spin.start("Comparing responses");

        let response = self
            .client
            .post(format!("{}/api/compare", self.host))
            .json(&json!({ "userQuery": user_query, "assistantResponses": responses }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            spin.stop("");
            render::error_line(&format!("Comparison failed ({}): {}", status, body));
            return Ok(());
        }

        drain_tagged_stream(response).await?;
        spin.stop("");
        Ok(())
    }
}

/// Record one event and render its transcript once it turns terminal.
fn fold_event(transcripts: &mut Accumulator, event: &TaggedEvent) {
    let terminal = event.event.is_terminal();
    transcripts.record(event);
    if terminal {
        if let Some(transcript) = transcripts.get(&event.key) {
            render_transcript(transcript);
        }
    }
}

/// Decode a tagged event body line by line, rendering each transcript at
/// its terminal event; the decoder remainder is drained so a final line
/// that never got its newline still lands.
async fn drain_tagged_stream(response: reqwest::Response) -> Result<Accumulator> {
    let mut transcripts = Accumulator::new();
    let mut decoder = LineDecoder::<TaggedEvent>::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for event in decoder.push(&chunk) {
            fold_event(&mut transcripts, &event);
        }
    }
    if let Some(event) = decoder.finish() {
        fold_event(&mut transcripts, &event);
    }
    Ok(transcripts)
}

fn render_transcript(transcript: &Transcript) {
    match transcript.state {
        TranscriptState::Complete => {
            render::agent_answer(&transcript.key.agent_name, &transcript.text)
        }
        TranscriptState::Failed => render::agent_failure(
            &transcript.key.agent_name,
            transcript
                .error
                .as_deref()
                .unwrap_or("Unknown error during streaming."),
            &transcript.text,
        ),
        TranscriptState::Open => {}
    }
}

/// Adapt one agent's chat endpoint into a fragment stream: chunk lines
/// become fragments, an end line exhausts the stream, an error line fails
/// it.
fn answer_stream(
    client: Client,
    host: String,
    messages: Vec<Message>,
    agent_id: String,
) -> FragmentStream {
    Box::pin(try_stream! {
        let response = client
            .post(format!("{}/api/chat", host))
            .json(&json!({ "messages": messages, "agentId": agent_id }))
            .send()
            .await
            .map_err(|e| ProviderError::Stream(e.to_string()))?;
        let response = check_status(response).await?;

        let mut body = response.bytes_stream();
        let mut lines = LineDecoder::<StreamEvent>::new();
        let mut ended = false;
        'read: while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| ProviderError::Stream(e.to_string()))?;
            for event in lines.push(&chunk) {
                match event {
                    StreamEvent::Chunk { content } => yield content,
                    StreamEvent::End => {
                        ended = true;
                        break 'read;
                    }
                    StreamEvent::Error { error } => {
                        let failed: Result<(), ProviderError> = Err(ProviderError::Stream(error));
                        failed?;
                    }
                }
            }
        }
        // A final line may arrive without its trailing newline
        if !ended {
            if let Some(event) = lines.finish() {
                match event {
                    StreamEvent::Chunk { content } => yield content,
                    StreamEvent::End => {}
                    StreamEvent::Error { error } => {
                        let failed: Result<(), ProviderError> = Err(ProviderError::Stream(error));
                        failed?;
                    }
                }
            }
        }
    })
}
