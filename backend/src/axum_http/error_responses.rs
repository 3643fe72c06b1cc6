use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crates::domain::value_objects::enums::quota_kinds::QuotaKind;
use serde::Serialize;
use thiserror::Error;

use crate::usecases::{
    accounts::AccountError, payments::PaymentError, quota_gate::GateError, quotas::QuotaError,
    webhooks::WebhookError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct QuotaExceededResponse {
    pub code: u16,
    pub message: String,
    pub kind: QuotaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message: message.into(),
    });

    (status, body).into_response()
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Upstream provider failed")]
    BadGateway,

    #[error("Service unavailable")]
    Unavailable,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Picks the variant for a use-case status. Messages of 5xx errors are dropped.
    fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized,
            StatusCode::BAD_REQUEST => AppError::BadRequest(message),
            StatusCode::FORBIDDEN => AppError::Forbidden(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::CONFLICT => AppError::Conflict(message),
            StatusCode::UNPROCESSABLE_ENTITY => AppError::Unprocessable(message),
            StatusCode::BAD_GATEWAY => AppError::BadGateway,
            StatusCode::SERVICE_UNAVAILABLE => AppError::Unavailable,
            _ => AppError::Internal(anyhow::anyhow!(message)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::BadGateway => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::Internal(_) => {
                // Don't leak internal error detail to client
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        error_response(status, message)
    }
}

impl From<QuotaError> for AppError {
    fn from(err: QuotaError) -> Self {
        AppError::from_status(err.status_code(), err.to_string())
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        AppError::from_status(err.status_code(), err.to_string())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        AppError::from_status(err.status_code(), err.to_string())
    }
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        AppError::from_status(err.status_code(), err.to_string())
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            GateError::Exceeded(exceeded) => {
                let body = Json(QuotaExceededResponse {
                    code: status.as_u16(),
                    message: format!("{} quota exceeded", exceeded.kind),
                    kind: exceeded.kind,
                    used: exceeded.used,
                    max: exceeded.max,
                });
                (status, body).into_response()
            }
            GateError::Unavailable(_) => error_response(status, "Quota service unavailable"),
        }
    }
}
