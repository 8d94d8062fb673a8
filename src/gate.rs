use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::metrics::{GATE_REJECTIONS, REQUEST_TOTAL};
use crate::origin;
use crate::rate_limit::client_key;
use crate::state::AppState;

/// Origin check, then rate limit, in front of every POST route.
/// GET info routes pass straight through.
pub async fn gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() != Method::POST {
        return Ok(next.run(request).await);
    }

    let path = request.uri().path().to_string();

    if !origin::is_allowed(request.uri(), request.headers()) {
        GATE_REJECTIONS.with_label_values(&["origin"]).inc();
        warn!(path = %path, "rejected cross-origin request");
        return Err(ApiError::InvalidOrigin);
    }

    let key = client_key(request.headers(), &path);
    let limiter = &state.rate_limiter;
    if !limiter.allow(&key) {
        GATE_REJECTIONS.with_label_values(&["rate_limit"]).inc();
        warn!(client = %key, "rate limit exceeded");
        return Err(ApiError::RateLimited {
            limit: limiter.max_requests(),
            retry_after_secs: limiter.window().as_secs(),
        });
    }

    REQUEST_TOTAL.with_label_values(&[path.as_str()]).inc();
    Ok(next.run(request).await)
}
