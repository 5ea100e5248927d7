use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{PageParams, PaginatedResponse};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::user::DeletedUserResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/deleted-users", get(deleted_users))
}

async fn deleted_users(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(page): Query<PageParams>,
) -> Result<Json<PaginatedResponse<DeletedUserResponse>>, ApiError> {
    let (skip, limit) = page.normalized();

    let total_count = repositories::deleted_users::count(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count deleted users"))?;
    let rows = repositories::deleted_users::list(state.db(), skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list deleted users"))?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(DeletedUserResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}
