//! API error type rendered as `{"detail": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use dcfcrew::ControlError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Error)]
#[error("[{status}] {message}")]
pub struct ApiError {
    pub status: StatusCode,
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

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::MissingCompanyName | ControlError::InvalidApiKey => {
                ApiError::bad_request(err.to_string())
            }
            ControlError::JobNotFound | ControlError::DownloadNotReady => {
                ApiError::not_found(err.to_string())
            }
            ControlError::Launch(_) => {
                error!(error = %err, "failed to launch pipeline");
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.message }));
        (self.status, body).into_response()
    }
}
