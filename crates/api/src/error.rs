//! JSON error responses.
//!
//! Every failure leaves the API as `{"error": "<CODE>", "message": "<text>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use tandem_core::expense::ExpenseError;
use tandem_core::settlement::SettlementError;
use tandem_shared::AppError;

/// An error ready to be rendered as an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Creates an error with an explicit status and code.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with the given code.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// 401 with the given code.
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    /// 403 for callers who are not part of a couple.
    pub fn no_couple() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "NO_COUPLE",
            "You are not part of a couple",
        )
    }

    /// HTTP status of the response.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_parts(status: u16, code: &'static str, message: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            code,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            error!(code = self.code, error = %self.message, "Request failed");
            "An error occurred".to_string()
        } else {
            self.message
        };

        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<SettlementError> for ApiError {
    fn from(e: SettlementError) -> Self {
        Self::from_parts(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<ExpenseError> for ApiError {
    fn from(e: ExpenseError) -> Self {
        Self::from_parts(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::from_parts(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(e: sea_orm::DbErr) -> Self {
        AppError::Database(e.to_string()).into()
    }
}
