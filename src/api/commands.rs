use crate::api::{ApiError, ApiState};
use crate::command::{Command, CommandSource};
use crate::nats::COMMAND_NOTIFICATION;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

const COMMAND_TYPES: [&str; 5] = ["goto", "stop", "return_home", "patrol", "set_speed"];

/// Operator command request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub robot_id: String,
    pub command_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

pub(crate) fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/commands", post(send_command))
        .route("/api/commands/:robot_id", get(robot_commands))
        .route("/api/commands/:robot_id/active", get(active_command))
}

/// POST /api/commands - Dispatch an operator command
async fn send_command(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CommandRequest>,
) -> Result<(StatusCode, Json<Command>), ApiError> {
    if !COMMAND_TYPES.contains(&req.command_type.as_str()) {
        return Err(ApiError::ValidationError(format!(
            "unknown commandType '{}'",
            req.command_type
        )));
    }
    if !state.registry.contains(&req.robot_id) {
        return Err(ApiError::NotFound(format!("Robot {} not found", req.robot_id)));
    }

    let command = state
        .dispatcher
        .send_command(
            state.bus.as_ref(),
            &req.robot_id,
            &req.command_type,
            req.parameters,
            CommandSource::Operator,
        )
        .await
        .map_err(|e| {
            warn!(robot_id = %req.robot_id, error = %e, "Operator command could not be dispatched");
            ApiError::PublishError(format!("{:#}", e))
        })?;

    state.notifier.broadcast_json(COMMAND_NOTIFICATION, &command);
    Ok((StatusCode::CREATED, Json(command)))
}

/// GET /api/commands/:robot_id - Commands for a robot, most recent first
async fn robot_commands(
    State(state): State<Arc<ApiState>>,
    Path(robot_id): Path<String>,
) -> Json<Vec<Command>> {
    Json(state.dispatcher.get_robot_commands(&robot_id))
}

/// GET /api/commands/:robot_id/active - Most recent non-terminal command, or null
async fn active_command(
    State(state): State<Arc<ApiState>>,
    Path(robot_id): Path<String>,
) -> Json<Option<Command>> {
    Json(state.dispatcher.get_active_command(&robot_id))
}
