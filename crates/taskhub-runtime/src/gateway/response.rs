use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use taskhub_core::TaskHubError;

/// Message returned for every unexpected failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error!";

/// Error envelope: `{"success": false, "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Domain errors that carry a client-facing message keep it; everything else
/// is logged and collapsed into a generic 500.
impl From<TaskHubError> for ApiError {
    fn from(err: TaskHubError) -> Self {
        match err {
            TaskHubError::NotFound(msg) => Self::not_found(msg),
            TaskHubError::Unauthorized(_) => Self::unauthorized("Unauthenticated"),
            TaskHubError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            TaskHubError::Validation(msg) | TaskHubError::Conflict(msg) => Self::bad_request(msg),
            other => {
                tracing::error!(error = %other, "Request failed");
                Self::internal()
            }
        }
    }
}
