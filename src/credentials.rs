//! Per-request credential resolution.
//!
//! A caller may bring their own provider keys in request headers; otherwise
//! the server's configured keys are used. Key values never reach the logs.

use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretBox};
use tracing::info;

pub const MOONDREAM_HEADER: &str = "x-moondream-key";
pub const OPENROUTER_HEADER: &str = "x-openrouter-key";
pub const OPENAI_HEADER: &str = "x-openai-key";

/// API key wrapper that prevents accidental logging.
pub struct ApiKey(SecretBox<str>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretBox::new(key.into().into_boxed_str()))
    }

    /// `None` for empty or whitespace-only input.
    pub fn non_empty(key: String) -> Option<Self> {
        if key.trim().is_empty() {
            None
        } else {
            Some(Self::new(key))
        }
    }

    /// Expose the secret for actual API calls.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

// Keys configured for the process (env / flags)
#[derive(Debug, Clone, Default)]
pub struct ServerKeys {
    pub moondream: Option<ApiKey>,
    pub openrouter: Option<ApiKey>,
    pub openai: Option<ApiKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    User,
    Server,
}

/// Pick the caller's key when it is non-empty after trimming, else the
/// server's. Logs only which source won.
pub fn resolve(
    user: Option<&str>,
    server: Option<&ApiKey>,
    label: &str,
) -> Option<(ApiKey, KeySource)> {
    if let Some(user) = user.map(str::trim).filter(|k| !k.is_empty()) {
        info!("Using user-provided {label} key");
        return Some((ApiKey::new(user), KeySource::User));
    }

    if let Some(server) = server {
        info!("Using server-side {label} key");
        return Some((server.clone(), KeySource::Server));
    }

    info!("No {label} key available");
    None
}

/// OpenAI-compatible chat providers, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionProvider {
    OpenRouter,
    OpenAi,
}

impl CompletionProvider {
    pub fn label(self) -> &'static str {
        match self {
            CompletionProvider::OpenRouter => "OpenRouter",
            CompletionProvider::OpenAi => "OpenAI",
        }
    }

    // OpenRouter namespaces model ids by vendor
    pub fn model_id(self, model: &str) -> String {
        match self {
            CompletionProvider::OpenRouter if !model.contains('/') => format!("openai/{model}"),
            _ => model.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderCredential {
    pub provider: CompletionProvider,
    pub key: ApiKey,
    pub source: KeySource,
}

// Raw header values, kept out of logs by the same wrapper
#[derive(Debug, Default)]
struct UserKeys {
    moondream: Option<ApiKey>,
    openrouter: Option<ApiKey>,
    openai: Option<ApiKey>,
}

impl UserKeys {
    fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ApiKey::new)
        };
        Self {
            moondream: read(MOONDREAM_HEADER),
            openrouter: read(OPENROUTER_HEADER),
            openai: read(OPENAI_HEADER),
        }
    }
}

/// Credential set for one inbound request. Built fresh per request and
/// resolved lazily so only the providers a route needs are logged.
#[derive(Debug)]
pub struct ApiKeyBundle<'a> {
    user: UserKeys,
    server: &'a ServerKeys,
}

impl<'a> ApiKeyBundle<'a> {
    pub fn from_request(headers: &HeaderMap, server: &'a ServerKeys) -> Self {
        Self {
            user: UserKeys::from_headers(headers),
            server,
        }
    }

    pub fn moondream(&self) -> Option<ApiKey> {
        resolve(
            self.user.moondream.as_ref().map(ApiKey::expose),
            self.server.moondream.as_ref(),
            "Moondream",
        )
        .map(|(key, _)| key)
    }

    pub fn openai(&self) -> Option<ApiKey> {
        resolve(
            self.user.openai.as_ref().map(ApiKey::expose),
            self.server.openai.as_ref(),
            "OpenAI",
        )
        .map(|(key, _)| key)
    }

    /// First provider that resolves, OpenRouter before OpenAI.
    pub fn completion_provider(&self) -> Option<ProviderCredential> {
        let candidates = [
            (
                CompletionProvider::OpenRouter,
                self.user.openrouter.as_ref(),
                self.server.openrouter.as_ref(),
            ),
            (
                CompletionProvider::OpenAi,
                self.user.openai.as_ref(),
                self.server.openai.as_ref(),
            ),
        ];

        candidates.into_iter().find_map(|(provider, user, server)| {
            resolve(user.map(ApiKey::expose), server, provider.label()).map(|(key, source)| {
                ProviderCredential {
                    provider,
                    key,
                    source,
                }
            })
        })
    }
}
