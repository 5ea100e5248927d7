use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_enrollment, CurrentAdmin, CurrentUser};
use crate::api::modules::lessons_by_module;
use crate::api::validation::ValidatedJson;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Course;
use crate::repositories;
use crate::repositories::courses::UpdateCourse;
use crate::repositories::progress::ProgressKind;
use crate::schemas::course::{CourseCreate, CourseResponse, CourseSummary, CourseUpdate};
use crate::schemas::module::CourseModuleResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route(
            "/:course_id",
            get(get_course).put(update_course).patch(update_course).delete(delete_course),
        )
        .route("/:course_id/recount", post(recount_course))
        .route("/module/:course_id", get(course_modules))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    let courses = repositories::courses::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;
    Ok(Json(courses.into_iter().map(CourseSummary::from_db).collect()))
}

async fn create_course(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    ValidatedJson(payload): ValidatedJson<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            order: payload.order,
            url: payload.url.trim(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Course already exists", "Failed to create course"))?;

    tracing::info!(course_id = %course.id, "Course created");
    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

pub(crate) async fn fetch_course(state: &AppState, course_id: &str) -> Result<Course, ApiError> {
    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

async fn get_course(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;
    Ok(Json(CourseResponse::from_db(course)))
}

async fn update_course(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(course_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = repositories::courses::update(
        state.db(),
        &course_id,
        UpdateCourse {
            title: payload.title.map(|t| t.trim().to_string()),
            order: payload.order,
            url: payload.url,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Course already exists", "Failed to update course"))?
    .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(CourseResponse::from_db(course)))
}

async fn delete_course(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(course_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::courses::delete(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::from_write(e, "Course is in use", "Failed to delete course"))?;

    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    tracing::info!(course_id = %course_id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn recount_course(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = repositories::counters::recount_course(state.db(), &course_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to recount course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    tracing::info!(
        course_id = %course.id,
        modules = course.modul_count,
        lessons = course.lesson_count,
        tasks = course.task_count,
        "Course counters recomputed"
    );
    Ok(Json(CourseResponse::from_db(course)))
}

async fn course_modules(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<CourseModuleResponse>>, ApiError> {
    fetch_course(&state, &course_id).await?;
    require_enrollment(&state, &user, &course_id).await?;

    let modules = repositories::modules::list(state.db(), Some(&course_id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list modules"))?;
    let module_ids = modules.iter().map(|m| m.id.clone()).collect::<Vec<_>>();

    let mut lessons = lessons_by_module(&state, &module_ids).await?;
    let statuses = repositories::progress::list_for_entities(
        state.db(),
        ProgressKind::Modules,
        &user.id,
        &module_ids,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to load module progress"))?
    .into_iter()
    .map(|row| (row.entity_id, row.status))
    .collect::<HashMap<_, _>>();

    let response = modules
        .into_iter()
        .map(|module| {
            let status = statuses.get(&module.id).copied().unwrap_or_default();
            let nested = lessons.remove(&module.id).unwrap_or_default();
            CourseModuleResponse::from_db(module, status, nested)
        })
        .collect();

    Ok(Json(response))
}
