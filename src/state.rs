use std::sync::Arc;

use crate::config::Config;
use crate::credentials::CompletionProvider;
use crate::rate_limit::RateLimiter;
use crate::upstream::{ChatClient, MoondreamClient, WikipediaClient};

// app's shared state
pub struct AppState {
    pub client: reqwest::Client,
    pub config: Config,
    pub rate_limiter: RateLimiter, // per client key + path
    pub moondream: MoondreamClient,
    pub wikipedia: WikipediaClient,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: Config, client: reqwest::Client) -> Arc<Self> {
        let upstreams = &config.upstreams;
        Arc::new(Self {
            rate_limiter: RateLimiter::new(&config.rate_limit),
            moondream: MoondreamClient::new(client.clone(), upstreams.moondream_url.clone()),
            wikipedia: WikipediaClient::new(client.clone(), upstreams.wikipedia_url.clone()),
            client,
            config,
        })
    }

    pub fn chat(&self, provider: CompletionProvider) -> ChatClient {
        let base_url = match provider {
            CompletionProvider::OpenRouter => &self.config.upstreams.openrouter_url,
            CompletionProvider::OpenAi => &self.config.upstreams.openai_url,
        };
        ChatClient::new(self.client.clone(), base_url.clone(), provider)
    }
}
