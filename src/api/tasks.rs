use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_enrollment, CurrentAdmin, CurrentUser};
use crate::api::validation::ValidatedJson;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::repositories::tasks::UpdateTask;
use crate::schemas::task::{
    ChatMessageCreate, ChatMessageResponse, TaskCreate, TaskListQuery, TaskResponse, TaskUpdate,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:task_id", get(get_task).put(update_task).patch(update_task).delete(delete_task))
        .route("/:task_id/chat", get(list_chat).post(post_chat))
}

async fn list_tasks(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = repositories::tasks::list(state.db(), query.lesson_id.as_deref(), query.must_complete)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tasks"))?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from_db).collect()))
}

async fn create_task(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    ValidatedJson(payload): ValidatedJson<TaskCreate>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let now = primitive_now_utc();
    let task = repositories::tasks::create(
        state.db(),
        repositories::tasks::CreateTask {
            id: &Uuid::new_v4().to_string(),
            lesson_id: &payload.lesson_id,
            title: payload.title.trim(),
            description: &payload.description,
            status: &payload.status,
            user_task_list: &payload.user_task_list,
            task_number: payload.task_number,
            last_time: payload.last_time.unwrap_or(now),
            order: payload.order,
            priority: payload.priority,
            must_complete: payload.must_complete,
            files: payload.files.as_deref(),
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Task already exists", "Failed to create task"))?;

    tracing::info!(task_id = %task.id, lesson_id = %task.lesson_id, "Task created");
    Ok((StatusCode::CREATED, Json(TaskResponse::from_db(task))))
}

async fn get_task(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = repositories::tasks::find_by_id(state.db(), &task_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch task"))?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    Ok(Json(TaskResponse::from_db(task)))
}

async fn update_task(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(task_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<TaskUpdate>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = repositories::tasks::update(
        state.db(),
        &task_id,
        UpdateTask {
            lesson_id: payload.lesson_id,
            title: payload.title.map(|t| t.trim().to_string()),
            description: payload.description,
            status: payload.status,
            user_task_list: payload.user_task_list,
            task_number: payload.task_number,
            last_time: payload.last_time,
            order: payload.order,
            priority: payload.priority,
            must_complete: payload.must_complete,
            files: payload.files,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Task already exists", "Failed to update task"))?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::from_db(task)))
}

async fn delete_task(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::tasks::delete(state.db(), &task_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete task"))?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Students must be enrolled in the task's course; admins read every thread.
async fn chat_scope<'a>(
    state: &AppState,
    user: &'a User,
    task_id: &str,
) -> Result<Option<&'a str>, ApiError> {
    let course_id = repositories::tasks::find_course_id(state.db(), task_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load task"))?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if user.is_admin() {
        return Ok(None);
    }
    require_enrollment(state, user, &course_id).await?;
    Ok(Some(user.id.as_str()))
}

async fn list_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<ChatMessageResponse>>, ApiError> {
    let author = chat_scope(&state, &user, &task_id).await?;

    let messages = repositories::task_chats::list_for_task(state.db(), &task_id, author)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list chat"))?;
    Ok(Json(messages.into_iter().map(ChatMessageResponse::from_db).collect()))
}

async fn post_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<ChatMessageCreate>,
) -> Result<(StatusCode, Json<ChatMessageResponse>), ApiError> {
    chat_scope(&state, &user, &task_id).await?;

    let message = repositories::task_chats::create(
        state.db(),
        repositories::task_chats::CreateMessage {
            id: &Uuid::new_v4().to_string(),
            task_id: &task_id,
            user_id: &user.id,
            text: &payload.text,
            file: payload.file.as_deref(),
            voice: payload.voice.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Message already exists", "Failed to save message"))?;

    Ok((StatusCode::CREATED, Json(ChatMessageResponse::from_db(message))))
}
