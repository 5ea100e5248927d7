use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::repositories::payments::LedgerError;
use crate::repositories::progress::ProgressError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(&'static str),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    /// Maps constraint violations raised by an insert or update to client errors.
    ///
    /// `duplicate` is the message returned for a unique violation.
    pub(crate) fn from_write(err: sqlx::Error, duplicate: &str, context: &str) -> Self {
        // Child inserts report a missing parent row this way.
        if let sqlx::Error::RowNotFound = err {
            return Self::NotFound("Parent record not found".to_string());
        }
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => return Self::BadRequest(duplicate.to_string()),
                Some("23503") => {
                    return Self::Conflict("Referenced record does not exist".to_string())
                }
                Some("23514") => {
                    return Self::BadRequest("Value violates a table constraint".to_string())
                }
                _ => {}
            }
        }
        Self::internal(err, context)
    }

    fn parts(&self) -> (StatusCode, String) {
        match self {
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message.to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Self::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
            Self::TooManyRequests(message) => (StatusCode::TOO_MANY_REQUESTS, message.to_string()),
            Self::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message.clone()),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UserNotFound => Self::NotFound("User not found".to_string()),
            LedgerError::InsufficientBalance { .. } => {
                Self::BadRequest("Insufficient balance".to_string())
            }
            LedgerError::BalanceOverflow { .. } => {
                Self::BadRequest("Amount exceeds the maximum balance".to_string())
            }
            LedgerError::Database(err) => Self::internal(err, "Failed to record payment"),
        }
    }
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::NotFound => Self::NotFound("Progress record not found".to_string()),
            backward @ ProgressError::Backward { .. } => Self::BadRequest(backward.to_string()),
            ProgressError::Database(err) => Self::internal(err, "Failed to update progress"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.parts();

        match &self {
            Self::ServiceUnavailable(_) => tracing::error!(error = %detail, "Service unavailable"),
            Self::Internal(_) => tracing::error!(error = %detail, "Internal server error"),
            _ => {}
        }

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response();

        if matches!(self, Self::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_sets_bearer_challenge() {
        let response = ApiError::Unauthorized("nope").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn backward_progress_is_a_bad_request() {
        let err: ApiError = ProgressError::Backward { from: "finished", to: "blocked" }.into();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg.contains("finished")));
    }

    #[test]
    fn insufficient_balance_is_a_bad_request() {
        let err: ApiError = LedgerError::InsufficientBalance { balance: 5, amount: 10 }.into();
        assert_eq!(err.parts().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn balance_overflow_is_a_bad_request() {
        let err: ApiError = LedgerError::BalanceOverflow { balance: 1, amount: i64::MAX }.into();
        assert_eq!(err.parts().0, StatusCode::BAD_REQUEST);
    }
}
