use super::StreamResponse;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use colloquy::models::message::Message;
use colloquy::stage;
use serde::Deserialize;
use serde_json::{json, Value};

// Matches the incoming JSON structure
#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Option<Vec<Message>>,
    #[serde(rename = "agentId")]
    agent_id: Option<String>,
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<StreamResponse, (StatusCode, Json<Value>)> {
    let (messages, agent_id) = match (request.messages, request.agent_id) {
        (Some(messages), Some(agent_id)) => (messages, agent_id),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing messages or agentId" })),
            ))
        }
    };

    let agent = match state.registry.find(&agent_id) {
        Some(agent) => agent.clone(),
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Agent with ID {} not found", agent_id) })),
            ))
        }
    };

    let (tx, response) = StreamResponse::channel(100);
    tokio::spawn(stage::run_generate(
        agent,
        state.provider_source.clone(),
        messages,
        tx,
    ));

    Ok(response)
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handler))
        .with_state(state)
}
