//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_ledger::LedgerError;
use domain_production::ProductionError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match &err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { .. } => ApiError::Validation(err.to_string()),
            PortError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            PortError::Connection { .. } => ApiError::Unavailable(err.to_string()),
            _ => {
                error!(error = %err, "Storage failure");
                ApiError::Internal("storage failure".to_string())
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Storage(port) => port.into(),
            LedgerError::BalanceMismatch { .. } => {
                error!(error = %err, "Ledger replay inconsistency");
                ApiError::Internal(err.to_string())
            }
            other if other.is_not_found() => ApiError::NotFound(other.to_string()),
            other if other.is_validation() => ApiError::Validation(other.to_string()),
            other => ApiError::Conflict(other.to_string()),
        }
    }
}

impl From<ProductionError> for ApiError {
    fn from(err: ProductionError) -> Self {
        match err {
            ProductionError::Ledger(ledger) => ledger.into(),
            ProductionError::Storage(port) => port.into(),
            ProductionError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            other if other.is_not_found() => ApiError::NotFound(other.to_string()),
            other if other.is_validation() => ApiError::Validation(other.to_string()),
            other => ApiError::Conflict(other.to_string()),
        }
    }
}
