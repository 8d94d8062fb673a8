use clap::Parser;
use std::time::Duration;

use crate::credentials::{ApiKey, ServerKeys};

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "wimage-gateway")]
#[command(about = "Image -> vision model -> Wikipedia -> visualization backend")]
pub struct Args {
    // Interface to bind
    #[arg(long, env = "WIMAGE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Rate limit max accepted requests per window, per client key
    #[arg(long, env = "WIMAGE_RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(long, env = "WIMAGE_RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // Tracked client keys before a sweep of empty entries
    #[arg(long, env = "WIMAGE_CLEANUP_THRESHOLD", default_value_t = 100)]
    pub cleanup_threshold: usize,

    // Max multipart upload size for /analyze
    #[arg(long, env = "WIMAGE_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    #[arg(long, env = "MOONDREAM_API_KEY", hide_env_values = true)]
    pub moondream_api_key: Option<String>,

    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "MOONDREAM_URL", default_value = "https://api.moondream.ai")]
    pub moondream_url: String,

    #[arg(long, env = "OPENAI_URL", default_value = "https://api.openai.com/v1")]
    pub openai_url: String,

    #[arg(long, env = "OPENROUTER_URL", default_value = "https://openrouter.ai/api/v1")]
    pub openrouter_url: String,

    #[arg(long, env = "WIKIPEDIA_URL", default_value = "https://en.wikipedia.org")]
    pub wikipedia_url: String,

    // Term cleaning and JSON extraction
    #[arg(long, env = "WIMAGE_SMALL_MODEL", default_value = "gpt-4o-mini")]
    pub small_model: String,

    // Summaries and streamed visualizations
    #[arg(long, env = "WIMAGE_LARGE_MODEL", default_value = "gpt-4o")]
    pub large_model: String,

    // One-shot visualization
    #[arg(long, env = "WIMAGE_VISUALIZATION_MODEL", default_value = "gpt-5")]
    pub visualization_model: String,

    // Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
    pub cleanup_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            cleanup_threshold: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub moondream_url: String,
    pub openai_url: String,
    pub openrouter_url: String,
    pub wikipedia_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            moondream_url: "https://api.moondream.ai".to_string(),
            openai_url: "https://api.openai.com/v1".to_string(),
            openrouter_url: "https://openrouter.ai/api/v1".to_string(),
            wikipedia_url: "https://en.wikipedia.org".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub small: String,
    pub large: String,
    pub visualization: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            small: "gpt-4o-mini".to_string(),
            large: "gpt-4o".to_string(),
            visualization: "gpt-5".to_string(),
        }
    }
}

/// Everything a handler may need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub rate_limit: RateLimitConfig,
    pub max_upload_bytes: usize,
    pub server_keys: ServerKeys,
    pub upstreams: UpstreamConfig,
    pub models: ModelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            max_upload_bytes: 10 * 1024 * 1024,
            server_keys: ServerKeys::default(),
            upstreams: UpstreamConfig::default(),
            models: ModelConfig::default(),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            rate_limit: RateLimitConfig {
                max_requests: args.rate_limit,
                window: Duration::from_secs(args.rate_window),
                cleanup_threshold: args.cleanup_threshold,
            },
            max_upload_bytes: args.max_upload_bytes,
            server_keys: ServerKeys {
                moondream: args.moondream_api_key.and_then(ApiKey::non_empty),
                openrouter: args.openrouter_api_key.and_then(ApiKey::non_empty),
                openai: args.openai_api_key.and_then(ApiKey::non_empty),
            },
            upstreams: UpstreamConfig {
                moondream_url: trim_base(args.moondream_url),
                openai_url: trim_base(args.openai_url),
                openrouter_url: trim_base(args.openrouter_url),
                wikipedia_url: trim_base(args.wikipedia_url),
            },
            models: ModelConfig {
                small: args.small_model,
                large: args.large_model,
                visualization: args.visualization_model,
            },
        }
    }
}

// "http://host/" and "http://host" should build the same endpoint urls
fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
