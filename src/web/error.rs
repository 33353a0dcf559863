use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{DetectError, ErrorKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    InvalidImage(String),
    PayloadTooLarge(String),
    ExampleNotFound(usize),
    DetectorFailed(String),
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ExampleNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DetectorFailed(_) | ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone()),
            ApiError::InvalidImage(msg) => ("invalid_image", msg.clone()),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg.clone()),
            ApiError::ExampleNotFound(id) => ("not_found", format!("Example {} not found", id)),
            ApiError::DetectorFailed(msg) => ("detector_failed", msg.clone()),
            ApiError::InternalError(msg) => ("internal_error", msg.clone()),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
        }
    }

    pub fn with_request_id(self, request_id: &str) -> ApiErrorResponse {
        ApiErrorResponse(self, Some(request_id.to_string()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(format!(
                "Upload exceeds the {} MiB limit",
                super::MAX_UPLOAD_BYTES / (1024 * 1024)
            )),
            _ => ApiError::InvalidRequest(err.body_text()),
        }
    }
}

impl From<DetectError> for ApiError {
    fn from(err: DetectError) -> Self {
        match err.kind() {
            ErrorKind::BadInput => ApiError::InvalidImage(err.to_string()),
            ErrorKind::Detector => ApiError::DetectorFailed(err.to_string()),
            ErrorKind::Io => ApiError::InternalError(err.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_response(None).message)
    }
}

/// An [`ApiError`] tagged with the id of the request that produced it
#[derive(Debug)]
pub struct ApiErrorResponse(pub ApiError, pub Option<String>);

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        ApiErrorResponse(err, None)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let ApiErrorResponse(err, request_id) = self;
        let status = err.status_code();
        let id = request_id.as_deref().unwrap_or("-");
        if status.is_server_error() {
            error!(request_id = %id, status = status.as_u16(), "Request failed: {}", err);
        } else {
            warn!(request_id = %id, status = status.as_u16(), "Request rejected: {}", err);
        }
        (status, Json(err.to_response(request_id))).into_response()
    }
}
