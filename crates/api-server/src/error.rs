//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rotation_core::RotationError;
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Rotation(err) => match err {
                RotationError::Validation(_) => StatusCode::BAD_REQUEST,
                RotationError::NotFound(_) | RotationError::NoSuchRotation(_) => {
                    StatusCode::NOT_FOUND
                }
                RotationError::AlreadyExists(_) | RotationError::NoCandidates => {
                    StatusCode::CONFLICT
                }
                RotationError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                RotationError::Config(_)
                | RotationError::Serialization(_)
                | RotationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Rotation(err) => err.code(),
            Self::Timeout(_) => "timeout",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rotation(RotationError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        metrics::counter!("api.errors", "code" => self.code()).increment(1);

        // Internal details stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal processing error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
