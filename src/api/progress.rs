use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::ApiJson;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::progress::ProgressKind;
use crate::schemas::progress::{
    progress_json, ProgressCreate, ProgressUpdate, UserTaskCreate, UserTaskResponse,
    UserTaskUpdate,
};

pub(crate) fn router() -> Router<AppState> {
    // Static `tasks` routes win over the `:kind` segment.
    Router::new()
        .route("/tasks", post(create_user_task))
        .route("/tasks/:record_id", patch(update_user_task))
        .route("/:kind", post(create_progress))
        .route("/:kind/:record_id", patch(update_progress))
}

fn parse_kind(raw: &str) -> Result<ProgressKind, ApiError> {
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|_| ApiError::NotFound(format!("Unknown progress kind '{raw}'")))
}

async fn entity_exists(state: &AppState, kind: ProgressKind, id: &str) -> Result<bool, ApiError> {
    let found = match kind {
        ProgressKind::Courses => repositories::courses::exists(state.db(), id).await,
        ProgressKind::Modules => {
            repositories::modules::find_by_id(state.db(), id).await.map(|m| m.is_some())
        }
        ProgressKind::Lessons => {
            repositories::lessons::find_by_id(state.db(), id).await.map(|l| l.is_some())
        }
    };
    found.map_err(|e| ApiError::internal(e, "Failed to check progress target"))
}

async fn create_progress(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(kind): Path<String>,
    ApiJson(payload): ApiJson<ProgressCreate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind = parse_kind(&kind)?;
    if !entity_exists(&state, kind, &payload.entity_id).await? {
        return Err(ApiError::NotFound("Progress target not found".to_string()));
    }

    let record = repositories::progress::create(
        state.db(),
        kind,
        &Uuid::new_v4().to_string(),
        &payload.user_id,
        &payload.entity_id,
        payload.status,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "Progress record already exists", "Failed to create progress")
    })?;

    tracing::info!(
        kind = kind.entity_column(),
        user_id = %record.user_id,
        entity_id = %record.entity_id,
        "Progress record created"
    );
    let support_days = state.settings().learning().support_period_days;
    Ok((StatusCode::CREATED, Json(progress_json(kind, record, support_days))))
}

async fn update_progress(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path((kind, record_id)): Path<(String, String)>,
    ApiJson(payload): ApiJson<ProgressUpdate>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&kind)?;
    let record =
        repositories::progress::advance(state.db(), kind, &record_id, payload.status, primitive_now_utc())
            .await?;

    let support_days = state.settings().learning().support_period_days;
    Ok(Json(progress_json(kind, record, support_days)))
}

async fn create_user_task(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    ApiJson(payload): ApiJson<UserTaskCreate>,
) -> Result<(StatusCode, Json<UserTaskResponse>), ApiError> {
    let row = repositories::progress::create_task(
        state.db(),
        &Uuid::new_v4().to_string(),
        &payload.user_id,
        &payload.task_id,
        payload.finished,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Task progress already exists", "Failed to create task progress"))?;

    Ok((StatusCode::CREATED, Json(UserTaskResponse::from_db(row))))
}

async fn update_user_task(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(record_id): Path<String>,
    ApiJson(payload): ApiJson<UserTaskUpdate>,
) -> Result<Json<UserTaskResponse>, ApiError> {
    let row = repositories::progress::set_task_finished(
        state.db(),
        &record_id,
        payload.finished,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update task progress"))?
    .ok_or_else(|| ApiError::NotFound("Task progress not found".to_string()))?;

    Ok(Json(UserTaskResponse::from_db(row)))
}
