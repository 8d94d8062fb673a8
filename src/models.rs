use serde::{Deserialize, Serialize};

// Request bodies. Fields are optional so a missing field becomes a 400 with
// a field-specific message instead of a generic deserialization error.

#[derive(Deserialize, Debug, Default)]
pub struct ItemsRequest {
    pub items: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ExtractJsonRequest {
    pub result: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UrlsRequest {
    pub urls: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Article {
    pub title: Option<String>,
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ArticlesRequest {
    pub articles: Option<Vec<Article>>,
    // single-article form accepted by the streaming route
    pub article: Option<Article>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Summary {
    pub title: String,
    pub summary: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct SummariesRequest {
    pub summaries: Option<Vec<Summary>>,
}

// Response bodies

#[derive(Serialize, Debug)]
pub struct AnalyzeResponse {
    pub result: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TermResult {
    pub term: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct TextResult {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct SummaryResult {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Items {
    pub items: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct BatchResponse<T> {
    pub success: bool,
    pub results: Vec<T>,
}

impl<T> BatchResponse<T> {
    pub fn new(results: Vec<T>) -> Self {
        Self {
            success: true,
            results,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ItemsResponse {
    pub success: bool,
    pub data: Items,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct HtmlResponse {
    pub success: bool,
    pub html: String,
}
