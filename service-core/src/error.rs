use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::{ApiResponse, ErrorBody};

/// Seconds a client should wait before retrying a transient failure.
const TRANSIENT_RETRY_AFTER_SECS: u32 = 1;

/// Response extension carrying the error code, for middleware that counts failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationErrors(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(anyhow::Error),

    #[error("Code allocation failed: {0}")]
    CodeAllocationFailed(String),

    #[error("Aggregation inconsistency: {0}")]
    AggregationInconsistency(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable error code exposed to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } | AppError::ValidationErrors(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ReferentialIntegrity(_) => "REFERENTIAL_INTEGRITY",
            AppError::CodeAllocationFailed(_) => "CODE_ALLOCATION_FAILED",
            AppError::AggregationInconsistency(_) => "AGGREGATION_INCONSISTENCY",
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::ValidationErrors(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ReferentialIntegrity(_) => StatusCode::CONFLICT,
            AppError::CodeAllocationFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AggregationInconsistency(_)
            | AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the envelope error body. Internal details never leave the process.
    pub fn to_body(&self) -> ErrorBody {
        let (message, field) = match self {
            AppError::Validation { field, message } => (message.clone(), Some(field.clone())),
            AppError::ValidationErrors(errs) => (
                errs.to_string(),
                errs.field_errors().keys().next().map(|k| k.to_string()),
            ),
            AppError::BadRequest(err)
            | AppError::NotFound(err)
            | AppError::ReferentialIntegrity(err) => (err.to_string(), None),
            AppError::CodeAllocationFailed(msg) => (msg.clone(), None),
            AppError::AggregationInconsistency(_) => {
                ("Booking totals could not be reconciled".to_string(), None)
            }
            AppError::InternalError(_) => ("Internal server error".to_string(), None),
            AppError::DatabaseError(_) => ("Database error".to_string(), None),
            AppError::ConfigError(_) => ("Configuration error".to_string(), None),
        };

        ErrorBody {
            code: self.code().to_string(),
            message,
            field,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let mut res = (status, Json(ApiResponse::failure(self.to_body()))).into_response();
        res.extensions_mut().insert(ErrorCode(self.code()));

        if matches!(self, AppError::CodeAllocationFailed(_)) {
            res.headers_mut().insert(
                axum::http::header::RETRY_AFTER,
                TRANSIENT_RETRY_AFTER_SECS.into(),
            );
        }

        res
    }
}
