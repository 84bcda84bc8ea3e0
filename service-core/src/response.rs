//! JSON response envelope shared by every HTTP endpoint.
//!
//! Every body has the shape `{ "success": bool, "data"?: ..., "error"?: {...} }`.
//! Successful handlers wrap their payload with [`ok`] or [`created`]; failures are
//! rendered by [`crate::error::AppError`]'s `IntoResponse` implementation.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Error payload with a stable machine-readable code.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// `200 OK` with the payload in `data`.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// `201 Created` with the payload in `data`.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_error() {
        let body = serde_json::to_value(ApiResponse::success(json!({ "id": 7 }))).unwrap();
        assert_eq!(body, json!({ "success": true, "data": { "id": 7 } }));
    }

    #[test]
    fn failure_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::failure(ErrorBody {
            code: "NOT_FOUND".to_string(),
            message: "Booking not found".to_string(),
            field: None,
        }))
        .unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": { "code": "NOT_FOUND", "message": "Booking not found" }
            })
        );
    }
}
