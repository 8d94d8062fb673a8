use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use std::sync::Arc;

use super::{body, non_empty};
use crate::error::ApiError;
use crate::fanout::fan_out;
use crate::models::{BatchResponse, ItemsRequest, TermResult, TextResult, UrlsRequest};
use crate::state::AppState;

pub async fn check_wikipedia_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "endpoint": "/check-wikipedia",
        "description": "Checks if Wikipedia articles exist for given terms using the MediaWiki API. Queries the API with each term and returns URLs for articles that exist.",
        "method": "POST",
        "apiUsed": "Wikipedia MediaWiki API (query action)",
    }))
}

pub async fn check_wikipedia_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ItemsRequest>, JsonRejection>,
) -> Result<Json<BatchResponse<TermResult>>, ApiError> {
    let items = non_empty(body(payload)?.items, "No valid items provided")?;

    let wikipedia = &state.wikipedia;
    let outcomes = fan_out(items, |term| async move { wikipedia.check_term(&term).await }).await;

    let results = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(check) => TermResult {
                term: outcome.input,
                exists: check.exists,
                page_id: check.page_id,
                url: check.url,
                error: None,
            },
            Err(e) => TermResult {
                term: outcome.input,
                exists: false,
                page_id: None,
                url: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Ok(Json(BatchResponse::new(results)))
}

pub async fn fetch_wikipedia_text_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UrlsRequest>, JsonRejection>,
) -> Result<Json<BatchResponse<TextResult>>, ApiError> {
    let urls = non_empty(body(payload)?.urls, "No valid URLs provided")?;

    let wikipedia = &state.wikipedia;
    let outcomes = fan_out(urls, |url| async move { wikipedia.fetch_text(&url).await }).await;

    let results = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(article) if article.text.is_empty() => TextResult {
                url: outcome.input,
                title: article.title,
                text: None,
                preview: None,
                error: Some("No text content found".to_string()),
            },
            Ok(article) => TextResult {
                url: outcome.input,
                title: article.title,
                text: Some(article.text),
                preview: Some(article.preview),
                error: None,
            },
            Err(e) => TextResult {
                url: outcome.input,
                title: None,
                text: None,
                preview: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Ok(Json(BatchResponse::new(results)))
}
