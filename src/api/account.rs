use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{enforce_rate_limit, require_lesson_access, CurrentSession, CurrentUser};
use crate::api::validation::{
    validate_image_upload, validate_password_confirmation, validate_phone, ValidatedJson,
};
use crate::core::redis::REGISTER_LIMIT;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserType;
use crate::repositories;
use crate::repositories::progress::ProgressKind;
use crate::repositories::users::UpdateUser;
use crate::schemas::certificate::CertificateResponse;
use crate::schemas::course::CourseSummary;
use crate::schemas::payment::PaymentResponse;
use crate::schemas::progress::progress_json;
use crate::schemas::task::TaskResponse;
use crate::schemas::user::{
    DeviceResponse, PasswordChangeRequest, ProfileResponse, RegisterRequest, TeacherResponse,
    UserResponse,
};
use crate::services::storage::profile_photo_key;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/delete", delete(delete_account))
        .route("/user/get-me", get(get_me))
        .route("/user/profile", patch(update_profile))
        .route("/user/profile/password", patch(change_password))
        .route("/user/device", get(list_devices))
        .route("/user/my-courses", get(my_courses))
        .route("/user/module", get(my_modules))
        .route("/user/task/:lesson_id", get(lesson_tasks))
        .route("/user/payments", get(my_payments))
        .route("/user/certificates", get(my_certificates))
        .route("/teachers", get(teachers))
}

async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let phone_number = payload.phone_number.trim();
    validate_phone(phone_number)?;
    validate_password_confirmation(&payload.password, &payload.confirm_password)?;

    enforce_rate_limit(
        &state,
        REGISTER_LIMIT,
        phone_number,
        "Too many registration attempts, try again later",
    )
    .await?;

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    // The unique index on phone_number decides duplicates, so parallel requests cannot both win.
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            phone_number,
            username: phone_number,
            first_name: payload.first_name.trim(),
            last_name: payload.last_name.trim(),
            hashed_password,
            user_type: UserType::Student,
            tg_id: None,
            has_registered_bot: false,
            is_active: true,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "User with this phone number already exists", "Failed to create user")
    })?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    let tombstone = repositories::users::delete_with_tombstone(state.db(), &user.id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete account"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, tombstone_id = %tombstone.id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn profile_response(state: &AppState, user: User) -> ProfileResponse {
    let photo_url = match state.storage() {
        Some(storage) => match storage.presign_get(&user.photo).await {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(error = %err, user_id = %user.id, "Failed to presign profile photo");
                None
            }
        },
        None => None,
    };

    ProfileResponse {
        first_name: user.first_name,
        last_name: user.last_name,
        photo: user.photo,
        photo_url,
    }
}

async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<ProfileResponse> {
    Json(profile_response(&state, user).await)
}

struct PhotoUpload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut changes = UpdateUser::default();
    let mut photo: Option<PhotoUpload> = None;
    let max_upload_mb = state.settings().storage().max_upload_size_mb;
    let max_bytes = max_upload_mb * 1024 * 1024;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "first_name" | "last_name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest(format!("Invalid {name}")))?;
                let text = text.trim().to_string();
                if text.is_empty() || text.chars().count() > 150 {
                    return Err(ApiError::BadRequest(format!("{name} must be 1-150 characters")));
                }
                if name == "first_name" {
                    changes.first_name = Some(text);
                } else {
                    changes.last_name = Some(text);
                }
            }
            "photo" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
                {
                    if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                        return Err(ApiError::BadRequest(format!(
                            "File size exceeds {max_upload_mb}MB limit"
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                photo = Some(PhotoUpload { filename, content_type, bytes });
            }
            _ => {}
        }
    }

    if let Some(upload) = photo {
        validate_image_upload(
            &upload.filename,
            &upload.content_type,
            &state.settings().storage().allowed_image_extensions,
        )?;
        if upload.bytes.is_empty() {
            return Err(ApiError::BadRequest("Photo is empty".to_string()));
        }

        let storage = state.storage().ok_or_else(|| {
            ApiError::ServiceUnavailable("Object storage is not configured".to_string())
        })?;
        let key = profile_photo_key(&user.id, &Uuid::new_v4().to_string(), &upload.filename);
        let stored = storage
            .upload_bytes(key, &upload.content_type, upload.bytes)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to upload profile photo"))?;

        tracing::info!(
            user_id = %user.id,
            key = %stored.key,
            size = stored.size,
            sha256 = %stored.sha256,
            "Profile photo uploaded"
        );
        changes.photo = Some(stored.key);
    }

    let updated = repositories::users::update(state.db(), &user.id, changes, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update profile"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(profile_response(&state, updated).await))
}

async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<PasswordChangeRequest>,
) -> Result<Json<Value>, ApiError> {
    validate_password_confirmation(&payload.password, &payload.confirm_password)?;

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    repositories::users::update(
        state.db(),
        &user.id,
        UpdateUser { hashed_password: Some(hashed_password), ..UpdateUser::default() },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}

async fn list_devices(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<Vec<DeviceResponse>>, ApiError> {
    let devices = repositories::devices::list_for_user(state.db(), &session.user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list devices"))?;

    let current = session.device_id.as_deref();
    Ok(Json(devices.into_iter().map(|d| DeviceResponse::from_db(d, current)).collect()))
}

async fn my_courses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    let courses = repositories::courses::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;
    Ok(Json(courses.into_iter().map(CourseSummary::from_db).collect()))
}

async fn my_modules(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Value>>, ApiError> {
    let rows = repositories::progress::list_for_user(state.db(), ProgressKind::Modules, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list module progress"))?;

    let support_days = state.settings().learning().support_period_days;
    Ok(Json(
        rows.into_iter()
            .map(|row| progress_json(ProgressKind::Modules, row, support_days))
            .collect(),
    ))
}

async fn lesson_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    require_lesson_access(&state, &user, &lesson_id).await?;

    let tasks = repositories::tasks::list(state.db(), Some(&lesson_id), Some(false))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list tasks"))?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from_db).collect()))
}

async fn my_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = repositories::payments::list(state.db(), Some(&user.id), 0, 1000)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list payments"))?;
    Ok(Json(payments.into_iter().map(PaymentResponse::from_db).collect()))
}

async fn my_certificates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CertificateResponse>>, ApiError> {
    let certificates = repositories::certificates::list(state.db(), Some(&user.id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list certificates"))?;
    Ok(Json(certificates.into_iter().map(CertificateResponse::from_db).collect()))
}

async fn teachers(State(state): State<AppState>) -> Result<Json<Vec<TeacherResponse>>, ApiError> {
    let teachers = repositories::users::list_by_type(state.db(), UserType::Teacher)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list teachers"))?;
    Ok(Json(teachers.into_iter().map(TeacherResponse::from_db).collect()))
}

#[cfg(test)]
mod tests;
