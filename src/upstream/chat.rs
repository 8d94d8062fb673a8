//! OpenAI-compatible chat completions, used for both OpenAI and OpenRouter.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::credentials::{ApiKey, CompletionProvider};
use crate::error::UpstreamError;
use crate::metrics::UPSTREAM_LATENCY;

// Deltas buffered between the upstream reader and the client writer
const STREAM_BUFFER: usize = 64;

#[derive(Debug, Clone, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
    // strict json_schema, e.g. { "name": ..., "strict": true, "schema": ... }
    JsonSchema(Value),
}

impl ResponseFormat {
    fn to_wire(&self) -> Option<Value> {
        match self {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some(serde_json::json!({ "type": "json_object" })),
            ResponseFormat::JsonSchema(schema) => Some(serde_json::json!({
                "type": "json_schema",
                "json_schema": schema,
            })),
        }
    }
}

/// One system + one user turn; every route needs exactly this.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub response_format: ResponseFormat,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: Option<WireContent>,
    delta: Option<WireContent>,
}

#[derive(Deserialize)]
struct WireContent {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    provider: CompletionProvider,
}

impl ChatClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        provider: CompletionProvider,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            provider,
        }
    }

    pub fn provider(&self) -> CompletionProvider {
        self.provider
    }

    async fn send(
        &self,
        api_key: &ApiKey,
        request: &ChatRequest,
        stream: bool,
    ) -> Result<reqwest::Response, UpstreamError> {
        let model = self.provider.model_id(&request.model);
        let body = WireRequest {
            model: &model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            response_format: request.response_format.to_wire(),
            stream,
        };

        debug!(provider = self.provider.label(), model = %model, stream, "chat completion request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(
                provider = self.provider.label(),
                status = status.as_u16(),
                "chat completion failed"
            );
            return Err(UpstreamError::status(self.provider.label(), status, &text));
        }
        Ok(response)
    }

    /// Full reply text; empty when the model returned no content.
    pub async fn complete(
        &self,
        api_key: &ApiKey,
        request: &ChatRequest,
    ) -> Result<String, UpstreamError> {
        let timer = UPSTREAM_LATENCY
            .with_label_values(&[self.provider.label()])
            .start_timer();
        let response = self.send(api_key, request, false).await?;
        let parsed: WireResponse = response.json().await?;
        timer.observe_duration();

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default())
    }

    /// Start a streamed completion. Text deltas arrive on the returned
    /// channel; it closes when the model finishes or the upstream fails.
    /// Dropping the receiver stops the reader task.
    pub async fn stream(
        &self,
        api_key: &ApiKey,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<String>, UpstreamError> {
        let response = self.send(api_key, request, true).await?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let provider = self.provider.label();

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::default();

            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(provider, error = %e, "upstream stream interrupted");
                        return;
                    }
                };

                for data in decoder.push(&bytes) {
                    match parse_delta(&data) {
                        Delta::Done => return,
                        Delta::Text(text) => {
                            if tx.send(text).await.is_err() {
                                debug!(provider, "stream consumer went away");
                                return;
                            }
                        }
                        Delta::Empty => {}
                        Delta::Invalid(e) => warn!(provider, error = %e, "skipping bad stream event"),
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Splits a server-sent-event byte stream into `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend(bytes.iter().filter(|&&b| b != b'\r'));

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            let event = String::from_utf8_lossy(&event[..pos]);

            let data: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|d| d.strip_prefix(' ').unwrap_or(d))
                .collect();
            if !data.is_empty() {
                payloads.push(data.join("\n"));
            }
        }
        payloads
    }
}

#[derive(Debug)]
enum Delta {
    Text(String),
    Empty,
    Done,
    Invalid(serde_json::Error),
}

fn parse_delta(data: &str) -> Delta {
    let data = data.trim();
    if data == "[DONE]" {
        return Delta::Done;
    }
    match serde_json::from_str::<WireResponse>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta)
            .and_then(|d| d.content)
            .filter(|text| !text.is_empty())
            .map_or(Delta::Empty, Delta::Text),
        Err(e) => Delta::Invalid(e),
    }
}
