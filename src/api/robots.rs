use crate::api::{ApiError, ApiState};
use crate::nats::ROBOT_NOTIFICATION;
use crate::robot::{RobotSnapshot, RobotType};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Registration request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub id: String,
    pub name: String,
    #[serde(alias = "robot_type")]
    pub robot_type: String,
}

pub(crate) fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/robots", get(list_robots).post(register_robot))
        .route("/api/robots/:id", get(get_robot))
}

/// GET /api/robots - All robots ordered by id
async fn list_robots(State(state): State<Arc<ApiState>>) -> Json<Vec<RobotSnapshot>> {
    Json(state.registry.all())
}

/// GET /api/robots/:id
async fn get_robot(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<RobotSnapshot>, ApiError> {
    state
        .registry
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Robot not found".to_string()))
}

/// POST /api/robots - Register (or refresh) a robot
async fn register_robot(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RobotSnapshot>), ApiError> {
    if req.id.is_empty() || req.id.contains(['.', '*', '>', ' ']) {
        return Err(ApiError::ValidationError(
            "id must be non-empty and contain no '.', '*', '>' or spaces".to_string(),
        ));
    }
    let robot_type = RobotType::parse(&req.robot_type).ok_or_else(|| {
        ApiError::ValidationError(format!("unknown robot_type '{}'", req.robot_type))
    })?;

    let snapshot = state.registry.register(&req.id, &req.name, robot_type);
    state.notifier.broadcast_json(ROBOT_NOTIFICATION, &snapshot);

    Ok((StatusCode::CREATED, Json(snapshot)))
}
