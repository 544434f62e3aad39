//! Second-stage orchestration: fan a comparison out to every
//! participating agent, then condense the completed analyses into a
//! summary table.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::accumulator::Accumulator;
use crate::agents::{Agent, AgentRegistry, SUMMARIZER_AGENT_ID};
use crate::models::event::StreamKey;
use crate::models::message::Message;
use crate::mux::{Multiplexer, EVENT_BUFFER};
use crate::prompt_template::{self, ComparisonContext, QuotedResponse, SummaryContext};
use crate::providers::base::{FragmentStream, Provider};
use crate::providers::factory::ProviderSource;
use crate::wire;

pub const ANALYST_SYSTEM: &str =
    "You are an expert analyst comparing arguments from multiple AI agents.";

pub const SUMMARIZER_SYSTEM: &str = "You are an AI assistant that ONLY outputs well-formatted \
     Markdown tables based on the provided analysis. You do not output any other text or \
     formatting.";

/// Run one agent's history against its provider, encoding the result as
/// untagged event lines on `out`. The caller has already resolved the
/// agent, so the only failures left are per-stream ones.
pub async fn run_generate(
    agent: Agent,
    source: Arc<dyn ProviderSource>,
    messages: Vec<Message>,
    out: mpsc::Sender<String>,
) {
    let key = StreamKey::new(agent.id.clone(), agent.name.clone());
    let (mut mux, mut events) = Multiplexer::channel(EVENT_BUFFER);
    match source.provider_for(&agent) {
        Ok(provider) => mux.spawn(key, open_stream(provider, agent.model.clone(), messages, None)),
        Err(e) => mux.spawn_failed(key, e.to_string()),
    }

    let drain = async {
        while let Some(event) = events.next().await {
            forward(&out, &event.event).await;
        }
    };
    tokio::join!(drain, mux.join());
}

/// Run the compare-and-summarize pass, encoding tagged event lines on
/// `out`.
///
/// Every distinct agent id among `responses` gets one concurrent analysis
/// task; an id the registry does not know yields a synthesized error event
/// without touching any provider. Once all analysis tasks have reached a
/// terminal, the analyses that ended cleanly feed the summarizer, whose
/// table events follow on the same stream. A missing or unavailable
/// summarizer skips the table quietly.
pub async fn run_compare(
    registry: Arc<AgentRegistry>,
    source: Arc<dyn ProviderSource>,
    user_query: Message,
    responses: Vec<Message>,
    out: mpsc::Sender<String>,
) {
    let mut participant_ids: Vec<String> = Vec::new();
    for response in &responses {
        if let Some(id) = &response.agent_id {
            if !id.is_empty() && !participant_ids.contains(id) {
                participant_ids.push(id.clone());
            }
        }
    }

    // Every response is quoted in every analyst's prompt, recognized or not
    let quoted: Vec<QuotedResponse> = responses
        .iter()
        .map(|response| QuotedResponse {
            name: response
                .agent_name
                .clone()
                .or_else(|| response.agent_id.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            content: response.content.clone(),
        })
        .collect();

    let (mut mux, mut events) = Multiplexer::channel(EVENT_BUFFER);
    for id in &participant_ids {
        let agent = match registry.find(id) {
            Some(agent) => agent,
            None => {
                tracing::warn!("Agent details not found for ID: {}. Skipping.", id);
                mux.spawn_failed(
                    StreamKey::new(id.clone(), format!("Unknown Agent ({})", id)),
                    "Agent configuration not found.",
                );
                continue;
            }
        };

        let key = StreamKey::new(agent.id.clone(), format!("{} (Analysis)", agent.name));
        let context = ComparisonContext {
            user_query: user_query.content.clone(),
            agent_name: agent.name.clone(),
            responses: quoted.clone(),
        };
        let prompt = match prompt_template::comparison_prompt(&context) {
            Ok(prompt) => prompt,
            Err(e) => {
                mux.spawn_failed(key, e.to_string());
                continue;
            }
        };
        match source.provider_for(agent) {
            Ok(provider) => mux.spawn(
                key,
                open_stream(
                    provider,
                    agent.model.clone(),
                    vec![Message::user(prompt)],
                    Some(ANALYST_SYSTEM.to_string()),
                ),
            ),
            Err(e) => mux.spawn_failed(key, e.to_string()),
        }
    }

    // Drain the analysis phase to completion before any summary event
    let mut transcripts = Accumulator::new();
    let drain = async {
        while let Some(event) = events.next().await {
            transcripts.record(&event);
            forward(&out, &event).await;
        }
    };
    tokio::join!(drain, mux.join());

    summarize(&registry, source, &user_query, &transcripts, &out).await;
}

/// Phase C: one summarizer stream over the clean analyses. Preconditions
/// that do not hold are logged and skipped rather than surfaced to the
/// caller.
async fn summarize(
    registry: &AgentRegistry,
    source: Arc<dyn ProviderSource>,
    user_query: &Message,
    transcripts: &Accumulator,
    out: &mpsc::Sender<String>,
) {
    let summarizer = match registry.find(SUMMARIZER_AGENT_ID) {
        Some(agent) => agent,
        None => {
            tracing::warn!("Summarizer agent not found.");
            return;
        }
    };

    let analyses: Vec<QuotedResponse> = transcripts
        .completed()
        .map(|transcript| QuotedResponse {
            name: transcript.key.agent_name.clone(),
            content: transcript.text.clone(),
        })
        .collect();
    if analyses.is_empty() {
        tracing::warn!("No completed analyses to summarize.");
        return;
    }

    let provider = match source.provider_for(summarizer) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!("Skipping summary: {}", e);
            return;
        }
    };
    let context = SummaryContext {
        user_query: user_query.content.clone(),
        analyses,
    };
    let prompt = match prompt_template::summarizer_prompt(&context) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::warn!("Skipping summary: {}", e);
            return;
        }
    };

    let key = StreamKey::new(
        summarizer.id.clone(),
        format!("{} (Table)", summarizer.name),
    );
    let (mut mux, mut events) = Multiplexer::channel(EVENT_BUFFER);
    mux.spawn(
        key,
        open_stream(
            provider,
            summarizer.model.clone(),
            vec![Message::user(prompt)],
            Some(SUMMARIZER_SYSTEM.to_string()),
        ),
    );
    let drain = async {
        while let Some(event) = events.next().await {
            forward(out, &event).await;
        }
    };
    tokio::join!(drain, mux.join());
}

/// Defer the provider call into the stream itself, so opening failures
/// surface as the stream's first (and only) error item.
fn open_stream(
    provider: Box<dyn Provider + Send + Sync>,
    model: String,
    messages: Vec<Message>,
    system: Option<String>,
) -> FragmentStream {
    Box::pin(async_stream::try_stream! {
        let mut fragments = provider
            .stream_chat(&model, &messages, system.as_deref())
            .await?;
        while let Some(piece) = fragments.next().await {
            let piece = piece?;
            yield piece;
        }
    })
}

/// Encode one record onto the sink. A closed sink makes this a no-op, so
/// producers keep draining even after the reader has gone away.
async fn forward<T: Serialize>(out: &mpsc::Sender<String>, record: &T) {
    match wire::encode_line(record) {
        Ok(line) => {
            let _ = out.send(line).await;
        }
        Err(e) => tracing::error!("Failed to encode stream event: {}", e),
    }
}
