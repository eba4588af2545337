use crate::analysis::SUGGESTION_NOTIFICATION;
use crate::api::{ApiError, ApiState};
use crate::command::{Command, CommandSource};
use crate::nats::COMMAND_NOTIFICATION;
use crate::suggestion::Suggestion;
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const NOT_PENDING: &str = "Suggestion not found or not pending";

#[derive(Deserialize)]
pub struct PendingParams {
    pub robot_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AllParams {
    pub limit: Option<usize>,
}

/// Result of approving a suggestion
#[derive(Serialize)]
pub struct ApproveResponse {
    pub suggestion: Suggestion,
    /// Command dispatched for the proposed action, if any
    pub command: Option<Command>,
    /// Why no command was dispatched despite a proposed action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub(crate) fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/ai/suggestions", get(list_pending))
        .route("/api/ai/suggestions/all", get(list_all))
        .route("/api/ai/suggestions/:id/approve", post(approve))
        .route("/api/ai/suggestions/:id/reject", post(reject))
}

/// GET /api/ai/suggestions?robot_id= - Pending suggestions, most recent first
async fn list_pending(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<PendingParams>,
) -> Json<Vec<Suggestion>> {
    Json(state.suggestions.get_pending(params.robot_id.as_deref()))
}

/// GET /api/ai/suggestions/all?limit=50 - Suggestions of any status, most recent first
async fn list_all(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<AllParams>,
) -> Json<Vec<Suggestion>> {
    let limit = params.limit.unwrap_or(state.default_suggestion_limit);
    Json(state.suggestions.get_all(limit))
}

/// POST /api/ai/suggestions/:id/approve
///
/// Approval is the only transition that dispatches: the proposed action
/// (robot id defaulting to the suggestion's robot) becomes an AI-sourced
/// command, is published, then marked sent. Exactly one concurrent approval
/// wins; the rest see 404.
async fn approve(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ApproveResponse>, ApiError> {
    let suggestion = state
        .suggestions
        .approve(&id)
        .ok_or_else(|| ApiError::NotFound(NOT_PENDING.to_string()))?;
    info!(suggestion_id = %id, robot_id = %suggestion.robot_id, "Suggestion approved");
    state.notifier.broadcast_json(SUGGESTION_NOTIFICATION, &suggestion);

    let Some(action) = suggestion.proposed_action.clone() else {
        return Ok(Json(ApproveResponse {
            suggestion,
            command: None,
            warning: None,
        }));
    };

    let robot_id = action
        .robot_id
        .clone()
        .unwrap_or_else(|| suggestion.robot_id.clone());
    if !state.registry.contains(&robot_id) {
        warn!(suggestion_id = %id, robot_id = %robot_id, "Proposed action targets unknown robot");
        return Ok(Json(ApproveResponse {
            suggestion,
            command: None,
            warning: Some(format!("Robot {} not found, no command dispatched", robot_id)),
        }));
    }

    let command = state
        .dispatcher
        .send_command(
            state.bus.as_ref(),
            &robot_id,
            &action.command_type,
            action.parameters.clone(),
            CommandSource::Ai,
        )
        .await;

    match command {
        Ok(command) => {
            state.notifier.broadcast_json(COMMAND_NOTIFICATION, &command);
            Ok(Json(ApproveResponse {
                suggestion,
                command: Some(command),
                warning: None,
            }))
        }
        Err(e) => {
            warn!(suggestion_id = %id, error = %e, "Approved action could not be dispatched");
            Err(ApiError::PublishError(format!("{:#}", e)))
        }
    }
}

/// POST /api/ai/suggestions/:id/reject
async fn reject(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<Suggestion>, ApiError> {
    let suggestion = state
        .suggestions
        .reject(&id)
        .ok_or_else(|| ApiError::NotFound(NOT_PENDING.to_string()))?;
    info!(suggestion_id = %id, robot_id = %suggestion.robot_id, "Suggestion rejected");
    state.notifier.broadcast_json(SUGGESTION_NOTIFICATION, &suggestion);
    Ok(Json(suggestion))
}
