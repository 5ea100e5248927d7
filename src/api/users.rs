use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::api::validation::{validate_phone, ValidatedJson};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::users::{UpdateUser, UserFilter};
use crate::schemas::user::{AdminUserCreate, AdminUserUpdate, UserListQuery, UserResponse};
use crate::schemas::MessageResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/get-me", get(get_me))
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).patch(update_user).delete(delete_user))
}

async fn get_me(CurrentUser(user): CurrentUser) -> Json<MessageResponse> {
    Json(MessageResponse { message: user.phone_number })
}

async fn list_users(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(params): Query<UserListQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 1000);
    let filter = UserFilter { user_type: params.user_type, search: params.search };

    let total_count = repositories::users::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;
    let users = repositories::users::list(state.db(), &filter, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(PaginatedResponse {
        items: users.into_iter().map(UserResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn create_user(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    ValidatedJson(payload): ValidatedJson<AdminUserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let phone_number = payload.phone_number.trim();
    validate_phone(phone_number)?;

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let username = payload.username.as_deref().map(str::trim).filter(|u| !u.is_empty());

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            phone_number,
            username: username.unwrap_or(phone_number),
            first_name: payload.first_name.trim(),
            last_name: payload.last_name.trim(),
            hashed_password,
            user_type: payload.user_type,
            tg_id: None,
            has_registered_bot: false,
            is_active: payload.is_active,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "User with this phone number already exists", "Failed to create user")
    })?;

    tracing::info!(admin_id = %admin.id, user_id = %user.id, user_type = ?user.user_type, "User created by admin");
    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn get_user(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse::from_db(user)))
}

async fn update_user(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(user_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<AdminUserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let hashed_password = payload
        .password
        .as_deref()
        .map(security::hash_password)
        .transpose()
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = repositories::users::update(
        state.db(),
        &user_id,
        UpdateUser {
            username: payload.username,
            first_name: payload.first_name,
            last_name: payload.last_name,
            user_type: payload.user_type,
            is_active: payload.is_active,
            hashed_password,
            photo: None,
            bot_options: payload.bot_options,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Username already taken", "Failed to update user"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from_db(user)))
}

async fn delete_user(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repositories::users::delete_with_tombstone(state.db(), &user_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(admin_id = %admin.id, user_id = %user_id, "User deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests;
