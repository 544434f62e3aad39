use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use colloquy::agents::Agent;

async fn handler(State(state): State<AppState>) -> Json<Vec<Agent>> {
    Json(state.registry.all().to_vec())
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/agents", get(handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use colloquy::agents::SUMMARIZER_AGENT_ID;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_lists_registry() {
        let app = routes(AppState::new());

        let request = Request::builder()
            .method("GET")
            .uri("/api/agents")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let agents: Vec<Agent> = serde_json::from_slice(&body).unwrap();

        assert_eq!(agents.len(), 5);
        assert!(agents.iter().any(|agent| agent.id == SUMMARIZER_AGENT_ID));
        assert!(agents.iter().any(|agent| agent.name == "GPT-4.1"));
    }
}
