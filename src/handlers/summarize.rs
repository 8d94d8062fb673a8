use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use super::{body, non_empty};
use crate::credentials::{ApiKeyBundle, CompletionProvider};
use crate::error::{ApiError, UpstreamError};
use crate::fanout::fan_out;
use crate::models::{Article, ArticlesRequest, BatchResponse, SummaryResult};
use crate::prompts::{SUMMARIZE_STREAM_SYSTEM, SUMMARIZE_SYSTEM, article_prompt};
use crate::state::AppState;
use crate::stream::text_response;
use crate::upstream::ChatRequest;

const MISSING_FIELDS: &str = "Missing text or title";
const NO_SUMMARY: &str = "No summary generated";

pub async fn summarize_text_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "endpoint": "/summarize-text",
        "description": "Summarizes Wikipedia articles using OpenAI",
        "method": "POST",
        "model": state.config.models.large,
        "systemPrompt": SUMMARIZE_SYSTEM,
    }))
}

pub async fn summarize_stream_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "endpoint": "/summarize-stream",
        "description": "Streams Wikipedia article summaries using OpenRouter or OpenAI",
        "method": "POST",
        "model": state.config.models.large,
        "systemPrompt": SUMMARIZE_STREAM_SYSTEM,
        "streaming": true,
    }))
}

// (title, text) when both are present and non-empty
fn complete_article(article: &Article) -> Option<(&str, &str)> {
    let title = article.title.as_deref().filter(|t| !t.is_empty())?;
    let text = article.text.as_deref().filter(|t| !t.is_empty())?;
    Some((title, text))
}

pub async fn summarize_text_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ArticlesRequest>, JsonRejection>,
) -> Result<Json<BatchResponse<SummaryResult>>, ApiError> {
    let api_key = ApiKeyBundle::from_request(&headers, &state.config.server_keys)
        .openai()
        .ok_or(ApiError::MissingCredential("OPENAI_API_KEY"))?;

    let articles = non_empty(body(payload)?.articles, "No valid articles provided")?;

    let chat = state.chat(CompletionProvider::OpenAi);
    let (chat, api_key, model) = (&chat, &api_key, state.config.models.large.as_str());
    let outcomes = fan_out(articles, |article| async move {
        let (title, text) = complete_article(&article)
            .ok_or_else(|| UpstreamError::Malformed(MISSING_FIELDS.to_string()))?;
        let request = ChatRequest::new(model, SUMMARIZE_SYSTEM, article_prompt(title, text));
        let summary = chat.complete(api_key, &request).await?;
        if summary.trim().is_empty() {
            warn!(title, "empty summary");
        } else {
            info!(title, "summary generated");
        }
        Ok::<_, UpstreamError>(summary)
    })
    .await;

    let results = outcomes
        .into_iter()
        .map(|outcome| {
            let title = outcome.input.title.filter(|t| !t.is_empty());
            match outcome.result {
                Ok(summary) => {
                    let summary = match summary.trim() {
                        "" => NO_SUMMARY.to_string(),
                        text => text.to_string(),
                    };
                    SummaryResult {
                        title: title.unwrap_or_default(),
                        summary,
                        error: None,
                    }
                }
                Err(e) => SummaryResult {
                    title: title.unwrap_or_else(|| "Unknown".to_string()),
                    summary: String::new(),
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    Ok(Json(BatchResponse::new(results)))
}

pub async fn summarize_stream_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ArticlesRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let credential = ApiKeyBundle::from_request(&headers, &state.config.server_keys)
        .completion_provider()
        .ok_or(ApiError::NoCompletionCredentials)?;

    let request = body(payload)?;
    let articles: Vec<Article> = request
        .articles
        .unwrap_or_default()
        .into_iter()
        .chain(request.article)
        .collect();

    let complete: Option<Vec<(&str, &str)>> = articles.iter().map(complete_article).collect();
    let prompt = match complete {
        Some(parts) if !parts.is_empty() => parts
            .into_iter()
            .map(|(title, text)| article_prompt(title, text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n"),
        _ => return Err(ApiError::BadRequest("Missing article title or text".to_string())),
    };

    info!(
        provider = credential.provider.label(),
        articles = articles.len(),
        "streaming summary"
    );
    let request = ChatRequest::new(state.config.models.large.as_str(), SUMMARIZE_STREAM_SYSTEM, prompt);
    let rx = state
        .chat(credential.provider)
        .stream(&credential.key, &request)
        .await
        .map_err(ApiError::upstream("Failed to stream summary"))?;

    Ok(text_response(rx))
}
