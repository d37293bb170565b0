//! HTTP mapping of realtime errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use roomcast_core::RealtimeError;

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError(pub RealtimeError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            RealtimeError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            RealtimeError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            RealtimeError::InvalidTaskStatus(_) | RealtimeError::InvalidPermissionType(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn exc_type(&self) -> &'static str {
        match &self.0 {
            RealtimeError::PermissionDenied(_) => "PermissionError",
            RealtimeError::TaskNotFound(_) => "DoesNotExistError",
            RealtimeError::InvalidTaskStatus(_) | RealtimeError::InvalidPermissionType(_) => {
                "ValidationError"
            }
            _ => "ServerError",
        }
    }
}

impl From<RealtimeError> for ApiError {
    fn from(e: RealtimeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = json!({
            "exc_type": self.exc_type(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
