use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::PaginatedResponse;
use crate::api::validation::ValidatedJson;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::payments::RecordPayment;
use crate::schemas::payment::{
    PaymentCreate, PaymentListQuery, PaymentResponse, RecordedPaymentResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_payments).post(record_payment))
}

async fn record_payment(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    ValidatedJson(payload): ValidatedJson<PaymentCreate>,
) -> Result<(StatusCode, Json<RecordedPaymentResponse>), ApiError> {
    let now = primitive_now_utc();
    let (payment, balance) = repositories::payments::record(
        state.db(),
        RecordPayment {
            id: &Uuid::new_v4().to_string(),
            user_id: &payload.user_id,
            reason: &payload.reason,
            expend: &payload.expend,
            amount: payload.amount,
            income: payload.income,
            processed_date: payload.processed_date.unwrap_or(now),
            created_at: now,
        },
    )
    .await?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %payment.user_id,
        amount = payment.amount,
        income = payment.income,
        balance,
        "Payment recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(RecordedPaymentResponse { payment: PaymentResponse::from_db(payment), balance }),
    ))
}

async fn list_payments(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, ApiError> {
    let skip = query.skip.max(0);
    let limit = query.limit.clamp(1, 1000);
    let user_id = query.user_id.as_deref();

    let total_count = repositories::payments::count(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count payments"))?;
    let payments = repositories::payments::list(state.db(), user_id, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list payments"))?;

    Ok(Json(PaginatedResponse {
        items: payments.into_iter().map(PaymentResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

#[cfg(test)]
mod tests;
