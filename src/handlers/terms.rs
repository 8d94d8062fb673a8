use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::IntoResponse,
};
use serde_json::Value;
use std::sync::Arc;

use super::{body, non_empty};
use crate::credentials::{ApiKeyBundle, CompletionProvider};
use crate::error::{ApiError, UpstreamError};
use crate::models::{ExtractJsonRequest, Items, ItemsRequest, ItemsResponse};
use crate::prompts::{CLEAN_TERMS_SYSTEM, EXTRACT_JSON_SYSTEM, observations_schema};
use crate::state::AppState;
use crate::upstream::{ChatRequest, ResponseFormat};

pub async fn extract_json_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "endpoint": "/extract-json",
        "description": "Extracts structured JSON from Moondream results using OpenAI",
        "method": "POST",
        "model": state.config.models.small,
        "systemPrompt": EXTRACT_JSON_SYSTEM,
    }))
}

// The model is told to answer {"items": [...]}, but json_object mode does not
// enforce a shape; accept the common variants.
fn parse_terms(reply: &str) -> Result<Vec<String>, UpstreamError> {
    let value: Value = serde_json::from_str(reply)?;

    let strings = |v: &Value| -> Option<Vec<String>> {
        v.as_array()?
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    };

    let found = match &value {
        Value::Array(_) => strings(&value),
        Value::Object(map) => ["items", "cleaned", "terms"]
            .iter()
            .find_map(|k| map.get(*k).and_then(strings))
            .or_else(|| map.values().find_map(strings)),
        _ => None,
    };

    found.ok_or_else(|| UpstreamError::Malformed("no list of terms in model reply".to_string()))
}

pub async fn clean_terms_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ItemsRequest>, JsonRejection>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let api_key = ApiKeyBundle::from_request(&headers, &state.config.server_keys)
        .openai()
        .ok_or(ApiError::MissingCredential("OPENAI_API_KEY"))?;

    let items = non_empty(body(payload)?.items, "No valid items provided")?;
    let terms = serde_json::to_string(&items).unwrap_or_default();

    let request = ChatRequest::new(
        state.config.models.small.as_str(),
        CLEAN_TERMS_SYSTEM,
        format!("Clean these terms: {terms}"),
    )
    .with_format(ResponseFormat::JsonObject);

    let reply = state
        .chat(CompletionProvider::OpenAi)
        .complete(&api_key, &request)
        .await
        .map_err(ApiError::upstream("Failed to clean terms"))?;

    if reply.is_empty() {
        return Err(ApiError::EmptyResult("No response from OpenAI"));
    }

    let cleaned = parse_terms(&reply).map_err(ApiError::upstream("Failed to clean terms"))?;

    Ok(Json(ItemsResponse {
        success: true,
        data: Items { items: cleaned },
        raw_result: None,
    }))
}

pub async fn extract_json_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ExtractJsonRequest>, JsonRejection>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let api_key = ApiKeyBundle::from_request(&headers, &state.config.server_keys)
        .openai()
        .ok_or(ApiError::MissingCredential("OPENAI_API_KEY"))?;

    let raw = body(payload)?
        .result
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No valid result provided".to_string()))?;

    let request = ChatRequest::new(state.config.models.small.as_str(), EXTRACT_JSON_SYSTEM, raw.as_str())
        .with_format(ResponseFormat::JsonSchema(observations_schema()));

    let reply = state
        .chat(CompletionProvider::OpenAi)
        .complete(&api_key, &request)
        .await
        .map_err(ApiError::upstream("Failed to extract JSON"))?;

    if reply.is_empty() {
        return Err(ApiError::EmptyResult("No content extracted from OpenAI"));
    }

    let data: Items = serde_json::from_str(&reply).map_err(|e| ApiError::Upstream {
        context: "Failed to extract JSON",
        source: e.into(),
    })?;

    Ok(Json(ItemsResponse {
        success: true,
        data,
        raw_result: Some(raw),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_from_items_object() {
        assert_eq!(
            parse_terms(r#"{"items":["curtain","wall"]}"#).unwrap(),
            vec!["curtain", "wall"]
        );
    }

    #[test]
    fn terms_from_legacy_shapes() {
        assert_eq!(parse_terms(r#"{"cleaned":["cat"]}"#).unwrap(), vec!["cat"]);
        assert_eq!(parse_terms(r#"["cat","dog"]"#).unwrap(), vec!["cat", "dog"]);
        assert_eq!(
            parse_terms(r#"{"note":"x","result":["lamp"]}"#).unwrap(),
            vec!["lamp"]
        );
    }

    #[test]
    fn reply_without_terms_is_malformed() {
        assert!(matches!(
            parse_terms(r#"{"note":"nothing here"}"#),
            Err(UpstreamError::Malformed(_))
        ));
        assert!(matches!(parse_terms("not json"), Err(UpstreamError::Json(_))));
        assert!(parse_terms(r#"{"items":[1,2]}"#).is_err());
    }
}
