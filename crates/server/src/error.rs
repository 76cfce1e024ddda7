use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contactscan_ocr::PipelineError;
use serde_json::json;
use thiserror::Error;

/// Message returned for every server-side failure; details only go to the log.
pub const GENERIC_FAILURE: &str = "Failed to extract text";
pub const NO_FILES: &str = "No files uploaded";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InvalidInput(msg) => ApiError::BadRequest(msg),
            PipelineError::Failure(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Upload failed: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
