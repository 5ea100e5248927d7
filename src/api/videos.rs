use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{validate_video_file, ValidatedJson};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::videos::UpdateVideo;
use crate::schemas::video::{VideoCreate, VideoListQuery, VideoResponse, VideoUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_videos).post(create_video)).route(
        "/:video_id",
        get(get_video).put(update_video).patch(update_video).delete(delete_video),
    )
}

async fn list_videos(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<VideoListQuery>,
) -> Result<Json<Vec<VideoResponse>>, ApiError> {
    let videos = repositories::videos::list(state.db(), query.lesson_id.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list videos"))?;
    Ok(Json(videos.into_iter().map(VideoResponse::from_db).collect()))
}

async fn create_video(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    ValidatedJson(payload): ValidatedJson<VideoCreate>,
) -> Result<(StatusCode, Json<VideoResponse>), ApiError> {
    validate_video_file(payload.file.trim())?;

    let video = repositories::videos::create(
        state.db(),
        repositories::videos::CreateVideo {
            id: &Uuid::new_v4().to_string(),
            lesson_id: &payload.lesson_id,
            title: payload.title.trim(),
            description: &payload.description,
            media_code: &payload.media_code,
            file: payload.file.trim(),
            is_youtube: payload.is_youtube,
            media_url: &payload.media_url,
            order: payload.order,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Video already exists", "Failed to create video"))?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from_db(video))))
}

async fn get_video(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(video_id): Path<String>,
) -> Result<Json<VideoResponse>, ApiError> {
    let video = repositories::videos::find_by_id(state.db(), &video_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch video"))?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;
    Ok(Json(VideoResponse::from_db(video)))
}

async fn update_video(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(video_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<VideoUpdate>,
) -> Result<Json<VideoResponse>, ApiError> {
    if let Some(file) = payload.file.as_deref() {
        validate_video_file(file.trim())?;
    }

    let video = repositories::videos::update(
        state.db(),
        &video_id,
        UpdateVideo {
            lesson_id: payload.lesson_id,
            title: payload.title.map(|t| t.trim().to_string()),
            description: payload.description,
            media_code: payload.media_code,
            file: payload.file.map(|f| f.trim().to_string()),
            is_youtube: payload.is_youtube,
            media_url: payload.media_url,
            order: payload.order,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Video already exists", "Failed to update video"))?
    .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    Ok(Json(VideoResponse::from_db(video)))
}

async fn delete_video(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(video_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::videos::delete(state.db(), &video_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete video"))?;

    if !deleted {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests;
