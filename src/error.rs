use axum::{
    Json,
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failure talking to a third-party service.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error: {status} {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Malformed(String),
}

impl UpstreamError {
    pub fn status(service: &'static str, status: reqwest::StatusCode, body: &str) -> Self {
        UpstreamError::Status {
            service,
            status: status.as_u16(),
            body: excerpt(body, 200).to_string(),
        }
    }
}

fn window_phrase(secs: &u64) -> String {
    match *secs {
        60 => "minute".to_string(),
        1 => "second".to_string(),
        n => format!("{n} seconds"),
    }
}

// Error bodies can be whole HTML pages
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Everything a route can answer with besides success.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid origin")]
    InvalidOrigin,

    #[error("Rate limit exceeded. Maximum {limit} requests per {} allowed.", window_phrase(.retry_after_secs))]
    RateLimited { limit: usize, retry_after_secs: u64 },

    #[error("{0} not configured")]
    MissingCredential(&'static str),

    #[error("No API keys configured (need OpenRouter or OpenAI)")]
    NoCompletionCredentials,

    #[error("{0}")]
    BadRequest(String),

    // reply came back but carried nothing usable
    #[error("{0}")]
    EmptyResult(&'static str),

    #[error("{context}")]
    Upstream {
        context: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl ApiError {
    pub fn upstream(context: &'static str) -> impl FnOnce(UpstreamError) -> ApiError {
        move |source| ApiError::Upstream { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidOrigin => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredential(_)
            | ApiError::NoCompletionCredentials
            | ApiError::EmptyResult(_)
            | ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(format!("Invalid form data: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Upstream { source, .. } => {
                tracing::error!(error = %source, "{self}");
                json!({ "error": self.to_string(), "details": source.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited {
            retry_after_secs, ..
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::InvalidOrigin.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::RateLimited {
                limit: 10,
                retry_after_secs: 60
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::BadRequest("No image provided".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MissingCredential("OPENAI_API_KEY").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response = ApiError::RateLimited {
            limit: 10,
            retry_after_secs: 60,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
    }

    #[test]
    fn messages_match_public_envelopes() {
        assert_eq!(
            ApiError::RateLimited {
                limit: 10,
                retry_after_secs: 60
            }
            .to_string(),
            "Rate limit exceeded. Maximum 10 requests per minute allowed."
        );
        assert_eq!(
            ApiError::MissingCredential("MOONDREAM_API_KEY").to_string(),
            "MOONDREAM_API_KEY not configured"
        );
    }

    #[test]
    fn rate_limit_message_names_a_custom_window() {
        assert_eq!(
            ApiError::RateLimited {
                limit: 5,
                retry_after_secs: 30
            }
            .to_string(),
            "Rate limit exceeded. Maximum 5 requests per 30 seconds allowed."
        );
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("short", 200), "short");
    }
}
