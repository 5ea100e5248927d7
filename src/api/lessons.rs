use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_lesson_enrollment, CurrentAdmin, CurrentUser};
use crate::api::validation::{validate_material_file, ApiJson, ValidatedJson};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Lesson;
use crate::repositories;
use crate::repositories::lessons::UpdateLesson;
use crate::schemas::lesson::{
    LessonCreate, LessonDetailResponse, LessonListQuery, LessonResponse, LessonUpdate,
    QuestionCreate, QuestionResponse,
};
use crate::schemas::video::VideoResponse;
use crate::services::slug;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lessons).post(create_lesson))
        .route(
            "/:lesson_id",
            get(lesson_detail).put(update_lesson).patch(update_lesson).delete(delete_lesson),
        )
        .route("/:lesson_id/questions", get(list_questions).post(ask_question))
}

fn normalized_materials(materials: Option<String>) -> Result<Option<String>, ApiError> {
    let materials = materials.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());
    if let Some(path) = materials.as_deref() {
        validate_material_file(path)?;
    }
    Ok(materials)
}

async fn fetch_lesson(state: &AppState, lesson_id: &str) -> Result<Lesson, ApiError> {
    repositories::lessons::find_by_id(state.db(), lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch lesson"))?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))
}

async fn list_lessons(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<LessonListQuery>,
) -> Result<Json<Vec<LessonResponse>>, ApiError> {
    let lessons = repositories::lessons::list(state.db(), query.module_id.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lessons"))?;
    Ok(Json(lessons.into_iter().map(LessonResponse::from_db).collect()))
}

async fn create_lesson(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    ValidatedJson(payload): ValidatedJson<LessonCreate>,
) -> Result<(StatusCode, Json<LessonResponse>), ApiError> {
    let materials = normalized_materials(payload.materials)?;
    let id = Uuid::new_v4().to_string();
    let slug = slug::resolve(payload.slug.as_deref(), &payload.title, &id[..8]);

    let lesson = repositories::lessons::create(
        state.db(),
        repositories::lessons::CreateLesson {
            id: &id,
            module_id: &payload.module_id,
            title: payload.title.trim(),
            order: payload.order,
            url: payload.url.trim(),
            materials: materials.as_deref(),
            slug: &slug,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Lesson already exists", "Failed to create lesson"))?;

    tracing::info!(lesson_id = %lesson.id, module_id = %lesson.module_id, "Lesson created");
    Ok((StatusCode::CREATED, Json(LessonResponse::from_db(lesson))))
}

async fn lesson_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
) -> Result<Json<LessonDetailResponse>, ApiError> {
    require_lesson_enrollment(&state, &user, &lesson_id).await?;

    let lesson = fetch_lesson(&state, &lesson_id).await?;
    if lesson.is_deleted {
        return Err(ApiError::NotFound("Lesson not found".to_string()));
    }

    let parts = repositories::videos::list(state.db(), Some(&lesson.id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list videos"))?;

    Ok(Json(LessonDetailResponse {
        lesson: LessonResponse::from_db(lesson),
        parts: parts.into_iter().map(VideoResponse::from_db).collect(),
    }))
}

async fn update_lesson(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(lesson_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<LessonUpdate>,
) -> Result<Json<LessonResponse>, ApiError> {
    let materials = normalized_materials(payload.materials)?;
    let slug = payload.slug.as_deref().map(slug::slugify).filter(|s| !s.is_empty());

    let lesson = repositories::lessons::update(
        state.db(),
        &lesson_id,
        UpdateLesson {
            module_id: payload.module_id,
            title: payload.title.map(|t| t.trim().to_string()),
            order: payload.order,
            url: payload.url,
            materials,
            is_deleted: payload.is_deleted,
            slug,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Lesson already exists", "Failed to update lesson"))?
    .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    Ok(Json(LessonResponse::from_db(lesson)))
}

async fn delete_lesson(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(lesson_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::lessons::delete(state.db(), &lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete lesson"))?;

    if !deleted {
        return Err(ApiError::NotFound("Lesson not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_questions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let author = if user.is_admin() {
        fetch_lesson(&state, &lesson_id).await?;
        None
    } else {
        require_lesson_enrollment(&state, &user, &lesson_id).await?;
        Some(user.id.as_str())
    };

    let questions = repositories::lesson_questions::list_for_lesson(state.db(), &lesson_id, author)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

async fn ask_question(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
    ApiJson(payload): ApiJson<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    require_lesson_enrollment(&state, &user, &lesson_id).await?;

    let payload = payload.normalized();
    if payload.is_empty() {
        return Err(ApiError::BadRequest(
            "Question needs text, a file or a voice message".to_string(),
        ));
    }

    let question = repositories::lesson_questions::create(
        state.db(),
        repositories::lesson_questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            lesson_id: &lesson_id,
            user_id: &user.id,
            text: payload.text.as_deref(),
            file: payload.file.as_deref(),
            voice_message: payload.voice_message.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Question already exists", "Failed to save question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

#[cfg(test)]
mod tests;
