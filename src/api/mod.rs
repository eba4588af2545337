// HTTP and WebSocket APIs for the operator dashboard

mod commands;
mod health;
mod robots;
mod suggestions;
mod websocket;

use crate::command::{CommandBus, CommandDispatcher};
use crate::notify::Notifier;
use crate::robot::RobotRegistry;
use crate::suggestion::SuggestionStore;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<RobotRegistry>,
    pub suggestions: Arc<SuggestionStore>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub bus: Arc<dyn CommandBus>,
    pub notifier: Arc<Notifier>,
    /// Page size for GET /api/ai/suggestions/all when no limit is given
    pub default_suggestion_limit: usize,
}

/// Create the full API router
pub fn create_router(state: ApiState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .merge(health::routes())
        .merge(robots::routes())
        .merge(suggestions::routes())
        .merge(commands::routes())
        .merge(websocket::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Unknown id or a suggestion that is no longer pending
    NotFound(String),
    ValidationError(String),
    /// Command could not be published to the robot
    PublishError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PublishError(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
