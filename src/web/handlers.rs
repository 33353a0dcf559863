use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use image::ImageFormat;
use serde::Serialize;
use serde_json::json;
use std::io::Cursor;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{ApiError, ApiErrorResponse};
use super::AppState;
use crate::models::{DetectOutcome, NO_OUTPUT_MESSAGE};

/// Multipart field carrying the uploaded image
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, Serialize)]
pub struct ExampleSummary {
    pub id: usize,
    pub name: String,
    pub image_url: String,
}

/// Encoded result of a detection request
#[derive(Debug)]
pub enum DetectReply {
    Png(Vec<u8>),
    Empty,
}

impl IntoResponse for DetectReply {
    fn into_response(self) -> Response {
        match self {
            DetectReply::Png(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
            DetectReply::Empty => (
                StatusCode::OK,
                Json(json!({
                    "outcome": "empty",
                    "message": NO_OUTPUT_MESSAGE,
                })),
            )
                .into_response(),
        }
    }
}

fn encode_outcome(outcome: DetectOutcome) -> Result<DetectReply, ApiError> {
    match outcome.into_image() {
        Some(image) => {
            let mut buf = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| ApiError::InternalError(format!("Failed to encode result: {}", e)))?;
            Ok(DetectReply::Png(buf))
        }
        None => Ok(DetectReply::Empty),
    }
}

/// Run a blocking job on the blocking pool and flatten join errors
async fn blocking<T, F>(job: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::InternalError(format!("Detection task failed: {}", e)))?
}

/// GET / - the UI page
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(state.index_html().to_string())
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "detector": state.pipeline.detector().name(),
        "examples": state.catalog.len(),
    }))
}

/// GET /api/examples
pub async fn list_examples_handler(State(state): State<AppState>) -> Json<Vec<ExampleSummary>> {
    let examples = state
        .catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(id, entry)| ExampleSummary {
            id,
            name: entry.name.clone(),
            image_url: format!("/examples/{}/image", id),
        })
        .collect();
    Json(examples)
}

/// GET /examples/:id/image - the raw example file
pub async fn example_image_handler(
    State(state): State<AppState>,
    Path(id): Path<usize>,
) -> Result<Response, ApiErrorResponse> {
    let request_id = Uuid::new_v4().to_string();

    let entry = state
        .catalog
        .get(id)
        .ok_or_else(|| ApiError::ExampleNotFound(id).with_request_id(&request_id))?;

    let bytes = tokio::fs::read(&entry.path).await.map_err(|e| {
        ApiError::InternalError(format!("Failed to read example '{}': {}", entry.name, e)).with_request_id(&request_id)
    })?;

    let content_type = ImageFormat::from_path(&entry.path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// POST /api/detect - multipart upload with an `image` field
pub async fn detect_upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<DetectReply, ApiErrorResponse> {
    let request_id = Uuid::new_v4().to_string();

    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from(e).with_request_id(&request_id))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::from(e).with_request_id(&request_id))?;
            upload = Some(bytes);
            break;
        }
    }

    let bytes = upload.ok_or_else(|| {
        ApiError::InvalidRequest(format!("Missing multipart field '{}'", IMAGE_FIELD)).with_request_id(&request_id)
    })?;

    info!(request_id = %request_id, bytes = bytes.len(), "Detection requested for upload");

    let pipeline = state.pipeline.clone();
    let reply = blocking(move || {
        let outcome = pipeline.run_bytes(&bytes)?;
        encode_outcome(outcome)
    })
    .await
    .map_err(|e| e.with_request_id(&request_id))?;

    debug!(request_id = %request_id, "Detection finished: {}", reply_kind(&reply));
    Ok(reply)
}

/// POST /api/examples/:id/detect - run detection on a catalog image
pub async fn detect_example_handler(
    State(state): State<AppState>,
    Path(id): Path<usize>,
) -> Result<DetectReply, ApiErrorResponse> {
    let request_id = Uuid::new_v4().to_string();

    if state.catalog.get(id).is_none() {
        return Err(ApiError::ExampleNotFound(id).with_request_id(&request_id));
    }

    info!(request_id = %request_id, example = id, "Detection requested for example");

    let pipeline = state.pipeline.clone();
    let catalog = state.catalog.clone();
    let reply = blocking(move || {
        let image = catalog
            .load_image(id)
            .map_err(|e| ApiError::InternalError(format!("{:#}", e)))?
            .ok_or(ApiError::ExampleNotFound(id))?;
        let outcome = pipeline.run(&image)?;
        encode_outcome(outcome)
    })
    .await
    .map_err(|e| e.with_request_id(&request_id))?;

    debug!(request_id = %request_id, "Detection finished: {}", reply_kind(&reply));
    Ok(reply)
}

fn reply_kind(reply: &DetectReply) -> &'static str {
    match reply {
        DetectReply::Png(_) => "annotated",
        DetectReply::Empty => "empty",
    }
}
