use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::metrics;
use crate::core::redis::RateLimit;
use crate::core::security::{self, TokenKind};
use crate::core::state::AppState;
use crate::db::models::User;
use crate::repositories;
use crate::repositories::progress::ProgressKind;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

/// The authenticated user plus the device their token was issued for, if any.
pub(crate) struct CurrentSession {
    pub(crate) user: User,
    pub(crate) device_id: Option<String>,
}

pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(parts)?;
        let claims = security::verify_token_kind(token, TokenKind::Access, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        // Logging out deletes the device, which revokes every token bound to it.
        if let Some(device_id) = claims.device.as_deref() {
            let alive = repositories::devices::exists_for_user(app_state.db(), device_id, &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load device"))?;
            if !alive {
                return Err(ApiError::Unauthorized("Token has been revoked"));
            }
        }

        Ok(CurrentSession { user, device_id: claims.device })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state).await?;
        Ok(CurrentUser(session.user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

/// Requires a `user_courses` row for the user and course.
pub(crate) async fn require_enrollment(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<(), ApiError> {
    let enrolled = repositories::progress::exists_for_user(
        state.db(),
        ProgressKind::Courses,
        &user.id,
        course_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;

    if enrolled {
        Ok(())
    } else {
        Err(ApiError::Forbidden("You are not enrolled in this course"))
    }
}

/// Requires enrollment in the course that owns the lesson. Unknown lessons are 404.
pub(crate) async fn require_lesson_enrollment(
    state: &AppState,
    user: &User,
    lesson_id: &str,
) -> Result<(), ApiError> {
    let course_id = repositories::lessons::find_course_id(state.db(), lesson_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load lesson"))?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    require_enrollment(state, user, &course_id).await
}

/// Requires a `user_lessons` row, which unlocks the lesson's task list.
pub(crate) async fn require_lesson_access(
    state: &AppState,
    user: &User,
    lesson_id: &str,
) -> Result<(), ApiError> {
    let unlocked = repositories::progress::exists_for_user(
        state.db(),
        ProgressKind::Lessons,
        &user.id,
        lesson_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to check lesson access"))?;

    if unlocked {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Lesson is not unlocked for you"))
    }
}

/// Fixed-window limit keyed by `subject`. Redis errors let the request through.
pub(crate) async fn enforce_rate_limit(
    state: &AppState,
    policy: RateLimit,
    subject: &str,
    message: &'static str,
) -> Result<(), ApiError> {
    match state.redis().allow(policy, subject).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            metrics::record_rate_limited(policy.scope);
            Err(ApiError::TooManyRequests(message))
        }
        Err(err) => {
            tracing::warn!(error = %err, scope = policy.scope, "Rate limit check failed; allowing request");
            Ok(())
        }
    }
}
