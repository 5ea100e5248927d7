use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::ApiJson;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, today_utc};
use crate::db::types::ProgressStatus;
use crate::repositories;
use crate::repositories::progress::ProgressKind;
use crate::schemas::certificate::{CertificateCreate, CertificateListQuery, CertificateResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_certificates).post(issue_certificate))
}

async fn issue_certificate(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    ApiJson(payload): ApiJson<CertificateCreate>,
) -> Result<(StatusCode, Json<CertificateResponse>), ApiError> {
    let progress = repositories::progress::find_for_user(
        state.db(),
        ProgressKind::Courses,
        &payload.user_id,
        &payload.course_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to load course progress"))?;

    match progress {
        Some(row) if row.status == ProgressStatus::Finished => {}
        Some(_) => {
            return Err(ApiError::BadRequest("Course is not finished yet".to_string()));
        }
        None => {
            return Err(ApiError::BadRequest("User is not enrolled in this course".to_string()));
        }
    }

    let id = Uuid::new_v4().to_string();
    let qr_code = payload
        .qr_code
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("certificates/{id}.png"));

    let certificate = repositories::certificates::create(
        state.db(),
        repositories::certificates::CreateCertificate {
            id: &id,
            user_id: &payload.user_id,
            course_id: &payload.course_id,
            finished_at: payload.finished_at.unwrap_or_else(today_utc),
            qr_code: &qr_code,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "Certificate already issued", "Failed to issue certificate")
    })?;

    tracing::info!(
        certificate_id = %certificate.id,
        user_id = %certificate.user_id,
        course_id = %certificate.course_id,
        "Certificate issued"
    );
    Ok((StatusCode::CREATED, Json(CertificateResponse::from_db(certificate))))
}

async fn list_certificates(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<CertificateListQuery>,
) -> Result<Json<Vec<CertificateResponse>>, ApiError> {
    let certificates = repositories::certificates::list(state.db(), query.user_id.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list certificates"))?;
    Ok(Json(certificates.into_iter().map(CertificateResponse::from_db).collect()))
}

#[cfg(test)]
mod tests;
