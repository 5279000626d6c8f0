//! Request handlers: map HTTP requests onto service calls and service
//! results back onto responses. Bodies and path ids arrive already validated
//! by [`crate::validation::validate`].

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use shared::{
    CreateTaskRequest, HealthResponse, MonthlyAnalytics, Task, TaskStatus, UpdateTaskRequest,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, NO_UPDATE_DATA, TASK_NOT_FOUND};
use crate::state::AppState;

/// An unrecognized `status` is ignored rather than rejected.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let status = query
        .get("status")
        .and_then(|raw| match raw.parse::<TaskStatus>() {
            Ok(status) => Some(status),
            Err(err) => {
                debug!(%err, "ignoring status filter");
                None
            }
        });

    let tasks = state.tasks.list(status).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    state
        .tasks
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(TASK_NOT_FOUND))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state.tasks.create(payload).await?;
    info!(id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest(NO_UPDATE_DATA));
    }
    let task = state.tasks.update(id, payload).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.tasks.delete(id).await?;
    info!(%id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn monthly_analytics(
    State(state): State<AppState>,
) -> Result<Json<Vec<MonthlyAnalytics>>, ApiError> {
    state
        .analytics
        .monthly()
        .await
        .map(Json)
        .map_err(|err| ApiError::unexpected("Error fetching monthly analytics", err))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::up())
}
