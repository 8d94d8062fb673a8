use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use super::{body, non_empty};
use crate::credentials::{ApiKeyBundle, CompletionProvider};
use crate::error::ApiError;
use crate::models::{HtmlResponse, SummariesRequest, Summary};
use crate::prompts::{VISUALIZATION_STREAM_SYSTEM, VISUALIZATION_SYSTEM, summaries_prompt};
use crate::state::AppState;
use crate::stream::text_response;
use crate::upstream::ChatRequest;

pub async fn generate_visualization_stream_info(
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "endpoint": "/generate-visualization-stream",
        "description": "Experimental streaming visualization generation",
        "method": "POST",
        "model": state.config.models.large,
        "systemPrompt": VISUALIZATION_STREAM_SYSTEM,
        "streaming": true,
    }))
}

fn format_summaries(summaries: &[Summary]) -> String {
    summaries_prompt(
        summaries
            .iter()
            .map(|s| (s.title.as_str(), s.summary.as_str())),
    )
}

/// Trim and drop a surrounding markdown code fence, if the model added one.
/// The opening and closing markers are removed independently.
pub fn strip_code_fences(reply: &str) -> String {
    let mut html = reply.trim();

    if let Some(rest) = html
        .strip_prefix("```html")
        .or_else(|| html.strip_prefix("```"))
    {
        html = rest.strip_prefix('\n').unwrap_or(rest);
    }
    if let Some(rest) = html.strip_suffix("```") {
        html = rest.strip_suffix('\n').unwrap_or(rest);
    }

    html.trim().to_string()
}

pub async fn generate_visualization_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SummariesRequest>, JsonRejection>,
) -> Result<Json<HtmlResponse>, ApiError> {
    let api_key = ApiKeyBundle::from_request(&headers, &state.config.server_keys)
        .openai()
        .ok_or(ApiError::MissingCredential("OPENAI_API_KEY"))?;

    let summaries = non_empty(body(payload)?.summaries, "No valid summaries provided")?;

    let prompt = format!(
        "\nArticle Summaries:\n{}\nReturn ONLY the complete HTML code, no explanations or markdown formatting.",
        format_summaries(&summaries)
    );
    let request = ChatRequest::new(
        state.config.models.visualization.as_str(),
        VISUALIZATION_SYSTEM,
        prompt,
    );

    let reply = state
        .chat(CompletionProvider::OpenAi)
        .complete(&api_key, &request)
        .await
        .map_err(ApiError::upstream("Failed to generate visualization"))?;

    if reply.trim().is_empty() {
        return Err(ApiError::EmptyResult("No HTML generated"));
    }

    Ok(Json(HtmlResponse {
        success: true,
        html: strip_code_fences(&reply),
    }))
}

pub async fn generate_visualization_stream_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SummariesRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let credential = ApiKeyBundle::from_request(&headers, &state.config.server_keys)
        .completion_provider()
        .ok_or(ApiError::NoCompletionCredentials)?;

    let summaries = non_empty(body(payload)?.summaries, "Missing summaries")?;
    info!(
        provider = credential.provider.label(),
        summaries = summaries.len(),
        "streaming visualization"
    );

    let request = ChatRequest::new(
        state.config.models.large.as_str(),
        VISUALIZATION_STREAM_SYSTEM,
        format!(
            "Create an expressive spatial typography visualization based on these Wikipedia summaries:\n\n{}",
            format_summaries(&summaries)
        ),
    );

    let rx = state
        .chat(credential.provider)
        .stream(&credential.key, &request)
        .await
        .map_err(ApiError::upstream("Failed to stream visualization"))?;

    Ok(text_response(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_fence() {
        assert_eq!(
            strip_code_fences("```html\n<!DOCTYPE html><p>x</p>\n```"),
            "<!DOCTYPE html><p>x</p>"
        );
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        assert_eq!(strip_code_fences("  ```\n<html></html>\n```\n"), "<html></html>");
    }

    #[test]
    fn strips_fences_without_newlines() {
        assert_eq!(
            strip_code_fences("```html<!DOCTYPE html><p>x</p>\n```"),
            "<!DOCTYPE html><p>x</p>"
        );
        assert_eq!(strip_code_fences("```html\n<p>x</p>```"), "<p>x</p>");
    }

    #[test]
    fn strips_lone_closing_fence() {
        assert_eq!(strip_code_fences("<html></html>\n```"), "<html></html>");
    }

    #[test]
    fn leaves_unfenced_html_alone() {
        assert_eq!(strip_code_fences("\n<html></html>  "), "<html></html>");
        assert_eq!(strip_code_fences("<pre>```</pre>"), "<pre>```</pre>");
    }

    #[test]
    fn summaries_are_joined_by_blank_lines() {
        let summaries = vec![
            Summary {
                title: "Paris".into(),
                summary: "Capital.".into(),
            },
            Summary {
                title: "Seine".into(),
                summary: "River.".into(),
            },
        ];
        assert_eq!(
            format_summaries(&summaries),
            "Title: Paris\nSummary: Capital.\n\nTitle: Seine\nSummary: River."
        );
    }
}
