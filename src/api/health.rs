use crate::api::ApiState;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    robots: usize,
    suggestions: usize,
    ws_clients: usize,
}

pub(crate) fn routes() -> Router<Arc<ApiState>> {
    Router::new().route("/api/health", get(health))
}

/// GET /api/health
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        robots: state.registry.len(),
        suggestions: state.suggestions.len(),
        ws_clients: state.notifier.receiver_count(),
    })
}
