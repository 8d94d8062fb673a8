mod analyze;
mod health;
mod metrics;
mod summarize;
mod terms;
mod visualize;
mod wikipedia;

use axum::{Json, extract::rejection::JsonRejection};

use crate::error::ApiError;

pub use analyze::{analyze_handler, analyze_info};
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use summarize::{summarize_stream_handler, summarize_stream_info, summarize_text_handler, summarize_text_info};
pub use terms::{clean_terms_handler, extract_json_handler, extract_json_info};
pub use visualize::{
    generate_visualization_handler, generate_visualization_stream_handler,
    generate_visualization_stream_info,
};
pub use wikipedia::{check_wikipedia_handler, check_wikipedia_info, fetch_wikipedia_text_handler};

// Unwrap a JSON body extracted as `Result`, so handlers can check
// credentials before reporting a bad payload.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(ApiError::from)
}

// Present and non-empty, else a 400 with the route's message
fn non_empty<T>(values: Option<Vec<T>>, message: &str) -> Result<Vec<T>, ApiError> {
    values
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}
