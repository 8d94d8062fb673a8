//! Backend for the image -> Wikipedia -> visualization pipeline.
//!
//! Every POST route runs behind the same gate (same-origin check, then a
//! per-client sliding-window rate limit) before calling its upstream.

pub mod config;
pub mod credentials;
pub mod error;
pub mod fanout;
pub mod gate;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod origin;
pub mod prompts;
pub mod rate_limit;
pub mod state;
pub mod stream;
pub mod upstream;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route(
            "/analyze",
            post(handlers::analyze_handler).get(handlers::analyze_info),
        )
        .route(
            "/check-wikipedia",
            post(handlers::check_wikipedia_handler).get(handlers::check_wikipedia_info),
        )
        .route("/clean-terms", post(handlers::clean_terms_handler))
        .route(
            "/extract-json",
            post(handlers::extract_json_handler).get(handlers::extract_json_info),
        )
        .route(
            "/fetch-wikipedia-text",
            post(handlers::fetch_wikipedia_text_handler),
        )
        .route(
            "/summarize-text",
            post(handlers::summarize_text_handler).get(handlers::summarize_text_info),
        )
        .route(
            "/summarize-stream",
            post(handlers::summarize_stream_handler).get(handlers::summarize_stream_info),
        )
        .route(
            "/generate-visualization",
            post(handlers::generate_visualization_handler),
        )
        .route(
            "/generate-visualization-stream",
            post(handlers::generate_visualization_stream_handler)
                .get(handlers::generate_visualization_stream_info),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), gate::gate));

    Router::new()
        .merge(gated)
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}
