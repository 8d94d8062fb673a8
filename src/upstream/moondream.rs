use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::credentials::ApiKey;
use crate::error::UpstreamError;
use crate::metrics::UPSTREAM_LATENCY;

// Moondream /v1/query request format
#[derive(Serialize)]
struct QueryRequest<'a> {
    image_url: String,
    question: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    answer: String,
}

#[derive(Debug, Clone)]
pub struct MoondreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl MoondreamClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Ask a question about an image, returning the model's free-text answer.
    pub async fn query(
        &self,
        api_key: &ApiKey,
        image: &[u8],
        mime: &str,
        question: &str,
    ) -> Result<String, UpstreamError> {
        let body = QueryRequest {
            image_url: format!(
                "data:{mime};base64,{}",
                general_purpose::STANDARD.encode(image)
            ),
            question,
            stream: false,
        };

        let timer = UPSTREAM_LATENCY.with_label_values(&["moondream"]).start_timer();
        let response = self
            .client
            .post(format!("{}/v1/query", self.base_url))
            .header("X-Moondream-Auth", api_key.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Moondream API error");
            return Err(UpstreamError::status("Moondream", status, &text));
        }

        let parsed: QueryResponse = response.json().await?;
        timer.observe_duration();
        info!("Successfully received result from Moondream");

        Ok(parsed.answer)
    }
}
