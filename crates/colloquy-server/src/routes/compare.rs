use super::StreamResponse;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use colloquy::models::message::Message;
use colloquy::stage;
use serde::Deserialize;
use serde_json::{json, Value};

// Matches the incoming JSON structure
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompareRequest {
    user_query: Option<Message>,
    assistant_responses: Option<Vec<Message>>,
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<StreamResponse, (StatusCode, Json<Value>)> {
    let (user_query, responses) = match (request.user_query, request.assistant_responses) {
        (Some(user_query), Some(responses)) if !responses.is_empty() => (user_query, responses),
        _ => {
            return Err(bad_request(
                "Missing or invalid userQuery or assistantResponses",
            ))
        }
    };

    let mut agent_ids: Vec<&str> = Vec::new();
    for response in &responses {
        if let Some(id) = response.agent_id.as_deref() {
            if !id.is_empty() && !agent_ids.contains(&id) {
                agent_ids.push(id);
            }
        }
    }
    if agent_ids.is_empty() {
        return Err(bad_request(
            "No valid agent IDs found in assistantResponses to perform comparison.",
        ));
    }

    let recognized = agent_ids
        .iter()
        .filter(|id| state.registry.find(id).is_some())
        .count();
    if recognized < 2 {
        return Err(bad_request(
            "At least two valid assistant responses are required for comparison.",
        ));
    }

    let (tx, response) = StreamResponse::channel(100);
    tokio::spawn(stage::run_compare(
        state.registry.clone(),
        state.provider_source.clone(),
        user_query,
        responses,
        tx,
    ));

    Ok(response)
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/compare", post(handler))
        .with_state(state)
}
