use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Payment;
use crate::schemas::dates::deserialize_option_datetime;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PaymentCreate {
    pub(crate) user_id: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "reason must be at most 255 characters"))]
    pub(crate) reason: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "expend must be at most 255 characters"))]
    pub(crate) expend: String,
    #[validate(range(min = 0, message = "amount must be non-negative"))]
    pub(crate) amount: i64,
    pub(crate) income: bool,
    #[serde(default, deserialize_with = "deserialize_option_datetime")]
    pub(crate) processed_date: Option<PrimitiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentListQuery {
    #[serde(default)]
    pub(crate) user_id: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct PaymentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) reason: String,
    pub(crate) expend: String,
    pub(crate) amount: i64,
    pub(crate) income: bool,
    pub(crate) processed_date: String,
    pub(crate) created_at: String,
}

impl PaymentResponse {
    pub(crate) fn from_db(payment: Payment) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            reason: payment.reason,
            expend: payment.expend,
            amount: payment.amount,
            income: payment.income,
            processed_date: format_primitive(payment.processed_date),
            created_at: format_primitive(payment.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordedPaymentResponse {
    pub(crate) payment: PaymentResponse,
    pub(crate) balance: i64,
}
