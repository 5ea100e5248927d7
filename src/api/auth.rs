use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{enforce_rate_limit, CurrentSession};
use crate::api::validation::ApiJson;
use crate::core::redis::LOGIN_LIMIT;
use crate::core::security::{self, TokenKind};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc, to_primitive_utc};
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::{
    AccessResponse, DeviceLoginResponse, RefreshRequest, TokenPairResponse, TokenUser,
    VerifyRequest,
};
use crate::schemas::user::{LoginRequest, PhoneCheckRequest, UserResponse};
use crate::services::devices::title_from_user_agent;

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/token", post(token))
        .route("/token/refresh", post(refresh))
        .route("/token/verify", post(verify))
        .route("/auth/login", post(device_login))
        .route("/auth/logout", post(logout))
        .route("/check/phone", post(check_phone))
}

/// Checks phone and password. Unknown phones and wrong passwords look the same to the caller.
async fn authenticate(state: &AppState, payload: &LoginRequest) -> Result<User, ApiError> {
    enforce_rate_limit(
        state,
        LOGIN_LIMIT,
        &payload.phone_number,
        "Too many login attempts, try again later",
    )
    .await?;

    let user = repositories::users::find_by_phone(state.db(), payload.phone_number.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized(BAD_CREDENTIALS))?;

    if !verified || !user.is_active {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    }

    Ok(user)
}

async fn token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let user = authenticate(&state, &payload).await?;

    let access = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;
    let refresh = security::create_refresh_token(&user.id, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to create refresh token"))?;

    tracing::info!(user_id = %user.id, "Issued token pair");

    Ok(Json(TokenPairResponse { access, refresh, user: TokenUser::from_db(user) }))
}

async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AccessResponse>, ApiError> {
    let claims = security::verify_token_kind(&payload.refresh, TokenKind::Refresh, state.settings())
        .map_err(|_| ApiError::Unauthorized("Token is invalid or expired"))?;

    let user = repositories::users::find_by_id(state.db(), &claims.sub)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;
    if !user.is_some_and(|user| user.is_active) {
        return Err(ApiError::Unauthorized("Token is invalid or expired"));
    }

    let access = security::create_access_token(&claims.sub, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(AccessResponse { access }))
}

async fn verify(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    security::verify_token(&payload.token, state.settings())
        .map_err(|_| ApiError::Unauthorized("Token is invalid or expired"))?;
    Ok(Json(json!({})))
}

async fn device_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<DeviceLoginResponse>, ApiError> {
    let user = authenticate(&state, &payload).await?;

    let user_agent = headers.get(header::USER_AGENT).and_then(|value| value.to_str().ok());
    let title = title_from_user_agent(user_agent);

    let device = repositories::devices::upsert(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        &title,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record device"))?;

    let issued = security::create_device_token(&user.id, &device.id, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(user_id = %user.id, device = %device.title, "Device login");

    Ok(Json(DeviceLoginResponse {
        token: issued.token,
        expiry: format_primitive(to_primitive_utc(issued.expires_at)),
        user: UserResponse::from_db(user),
    }))
}

async fn logout(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<StatusCode, ApiError> {
    let Some(device_id) = session.device_id else {
        return Err(ApiError::BadRequest("Token is not bound to a device".to_string()));
    };

    repositories::devices::delete_for_user(state.db(), &device_id, &session.user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete device"))?;

    tracing::info!(user_id = %session.user.id, device_id = %device_id, "Device logged out");
    Ok(StatusCode::NO_CONTENT)
}

async fn check_phone(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PhoneCheckRequest>,
) -> Result<Json<bool>, ApiError> {
    let exists = repositories::users::exists_by_phone(state.db(), payload.phone_number.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check phone number"))?;
    Ok(Json(exists))
}

#[cfg(test)]
mod tests;
