use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::ValidatedJson;
use crate::core::state::AppState;
use crate::core::time::{date_after_days, primitive_now_utc};
use crate::repositories;
use crate::repositories::modules::UpdateModule;
use crate::schemas::lesson::LessonBrief;
use crate::schemas::module::{ModuleCreate, ModuleResponse, ModuleUpdate};
use crate::services::slug;

#[derive(Debug, Deserialize)]
struct ModuleListQuery {
    #[serde(default)]
    course_id: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_modules).post(create_module)).route(
        "/:module_id",
        get(get_module).put(update_module).patch(update_module).delete(delete_module),
    )
}

/// Visible lessons grouped by module, in lesson order.
pub(crate) async fn lessons_by_module(
    state: &AppState,
    module_ids: &[String],
) -> Result<HashMap<String, Vec<LessonBrief>>, ApiError> {
    let lessons = repositories::lessons::list_visible_for_modules(state.db(), module_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list lessons"))?;

    let mut grouped: HashMap<String, Vec<LessonBrief>> = HashMap::new();
    for lesson in lessons {
        grouped.entry(lesson.module_id.clone()).or_default().push(LessonBrief::from_db(lesson));
    }
    Ok(grouped)
}

async fn module_response(
    state: &AppState,
    module: crate::db::models::Module,
) -> Result<ModuleResponse, ApiError> {
    let mut lessons = lessons_by_module(state, std::slice::from_ref(&module.id)).await?;
    let nested = lessons.remove(&module.id).unwrap_or_default();
    Ok(ModuleResponse::from_db(module, nested))
}

async fn list_modules(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<ModuleListQuery>,
) -> Result<Json<Vec<ModuleResponse>>, ApiError> {
    let modules = repositories::modules::list(state.db(), query.course_id.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list modules"))?;

    let module_ids = modules.iter().map(|m| m.id.clone()).collect::<Vec<_>>();
    let mut lessons = lessons_by_module(&state, &module_ids).await?;

    Ok(Json(
        modules
            .into_iter()
            .map(|module| {
                let nested = lessons.remove(&module.id).unwrap_or_default();
                ModuleResponse::from_db(module, nested)
            })
            .collect(),
    ))
}

async fn create_module(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    ValidatedJson(payload): ValidatedJson<ModuleCreate>,
) -> Result<(StatusCode, Json<ModuleResponse>), ApiError> {
    let exists = repositories::courses::exists(state.db(), &payload.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check course"))?;
    if !exists {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let now = primitive_now_utc();
    let slug = slug::resolve(payload.slug.as_deref(), &payload.title, &id[..8]);
    let support_day = payload
        .support_day
        .unwrap_or_else(|| date_after_days(now, state.settings().learning().support_period_days));

    let module = repositories::modules::create(
        state.db(),
        repositories::modules::CreateModule {
            id: &id,
            course_id: &payload.course_id,
            title: payload.title.trim(),
            learning_type: &payload.learning_type,
            has_in_tg: &payload.has_in_tg,
            order: payload.order,
            row_num: payload.row_num,
            support_day,
            slug: &slug,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Module already exists", "Failed to create module"))?;

    tracing::info!(module_id = %module.id, course_id = %module.course_id, "Module created");
    Ok((StatusCode::CREATED, Json(ModuleResponse::from_db(module, Vec::new()))))
}

async fn get_module(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(module_id): Path<String>,
) -> Result<Json<ModuleResponse>, ApiError> {
    let module = repositories::modules::find_by_id(state.db(), &module_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch module"))?
        .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))?;

    Ok(Json(module_response(&state, module).await?))
}

async fn update_module(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(module_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<ModuleUpdate>,
) -> Result<Json<ModuleResponse>, ApiError> {
    let slug = payload.slug.as_deref().map(slug::slugify).filter(|s| !s.is_empty());

    let module = repositories::modules::update(
        state.db(),
        &module_id,
        UpdateModule {
            course_id: payload.course_id,
            title: payload.title.map(|t| t.trim().to_string()),
            learning_type: payload.learning_type,
            has_in_tg: payload.has_in_tg,
            order: payload.order,
            row_num: payload.row_num,
            support_day: payload.support_day,
            slug,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Module already exists", "Failed to update module"))?
    .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))?;

    Ok(Json(module_response(&state, module).await?))
}

async fn delete_module(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(module_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::modules::delete(state.db(), &module_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete module"))?;

    if !deleted {
        return Err(ApiError::NotFound("Module not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
