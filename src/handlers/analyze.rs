use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::credentials::ApiKeyBundle;
use crate::error::ApiError;
use crate::models::AnalyzeResponse;
use crate::prompts::ANALYZE_QUESTION;
use crate::state::AppState;

const DEFAULT_MIME: &str = "image/jpeg";

pub async fn analyze_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "endpoint": "/analyze",
        "description": "Analyzes images using Moondream vision AI",
        "method": "POST",
        "query": ANALYZE_QUESTION,
    }))
}

struct Upload {
    bytes: Vec<u8>,
    mime: String,
}

fn bad_form(e: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Invalid form data: {}", e.body_text()))
}

// First field named "image", if any
async fn read_image(mut multipart: Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        if field.name() != Some("image") {
            continue;
        }
        let mime = field
            .content_type()
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or(DEFAULT_MIME)
            .to_string();
        let bytes = field.bytes().await.map_err(bad_form)?;
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Upload {
            bytes: bytes.to_vec(),
            mime,
        }));
    }
    Ok(None)
}

pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    info!("Starting image analysis request");

    let api_key = ApiKeyBundle::from_request(&headers, &state.config.server_keys)
        .moondream()
        .ok_or(ApiError::MissingCredential("MOONDREAM_API_KEY"))?;

    let upload = read_image(multipart?)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No image provided".to_string()))?;
    info!(mime = %upload.mime, size = upload.bytes.len(), "image received");

    let answer = state
        .moondream
        .query(&api_key, &upload.bytes, &upload.mime, ANALYZE_QUESTION)
        .await
        .map_err(ApiError::upstream("Failed to analyze image"))?;

    Ok(Json(AnalyzeResponse { result: answer }))
}
