//! API error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::Error;

/// Error body shared by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Wraps library errors so handlers can return them with `?`
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self.0 {
            Error::SourceUnavailable { endpoint, .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "External data source unavailable".to_string(),
                Some(json!(format!("Could not fetch data from {}", endpoint))),
            ),
            Error::NotFound(what) => (StatusCode::NOT_FOUND, what.to_string(), None),
            Error::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(json!({ (*field): message })),
            ),
            other => {
                // Logged in full, never echoed to the client
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;
