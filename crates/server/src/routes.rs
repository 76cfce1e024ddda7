use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contactscan_core::format_contact_list;
use contactscan_ocr::TempImage;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::{ApiError, NO_FILES};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    /// One `name - number` line per pair.
    Text,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub format: ResponseFormat,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_request_bytes;
    Router::new()
        .route("/upload", post(upload))
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /upload`: multipart images in, contact pairs out.
/// A request that is not multipart at all carries no files.
async fn upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        debug!("Rejected upload body: {}", rejection.body_text());
        ApiError::BadRequest(NO_FILES.to_string())
    })?;
    let images = stage_uploads(&state, multipart).await?;
    let pairs = state.pipeline.process(images).await?;

    Ok(match params.format {
        ResponseFormat::Json => Json(pairs).into_response(),
        ResponseFormat::Text => format_contact_list(&pairs).into_response(),
    })
}

/// Write each image part to the upload directory. On any error the
/// already-staged guards drop and delete their files.
async fn stage_uploads(state: &AppState, mut multipart: Multipart) -> Result<Vec<TempImage>, ApiError> {
    let max_files = state.max_files();
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(state.field_name.as_str()) {
            debug!(field = ?field.name(), "Ignoring unexpected multipart field");
            continue;
        }
        if images.len() == max_files {
            return Err(ApiError::BadRequest(format!("Too many files: at most {max_files} per request")));
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        let image = TempImage::stage(&state.upload_dir, &original_name, &data)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to stage {original_name}: {e}")))?;
        images.push(image);
    }

    debug!(images = images.len(), "Staged upload");
    Ok(images)
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Malformed multipart body: {}", e.body_text()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
