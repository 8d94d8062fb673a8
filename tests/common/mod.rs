#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Once;
use wimage_gateway::config::{Config, UpstreamConfig};
use wimage_gateway::credentials::{ApiKey, ServerKeys};
use wimage_gateway::state::AppState;

pub const HOST: &str = "wimage.test";
pub const ORIGIN: &str = "http://wimage.test";

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Every upstream pointed at one mock server.
pub fn config_for(upstream: &str, keys: ServerKeys) -> Config {
    Config {
        server_keys: keys,
        upstreams: UpstreamConfig {
            moondream_url: upstream.to_string(),
            openai_url: upstream.to_string(),
            openrouter_url: format!("{upstream}/openrouter"),
            wikipedia_url: upstream.to_string(),
        },
        ..Config::default()
    }
}

pub fn all_keys() -> ServerKeys {
    ServerKeys {
        moondream: Some(ApiKey::new("md-server")),
        openrouter: None,
        openai: Some(ApiKey::new("oa-server")),
    }
}

pub fn app(config: Config) -> Router {
    init_tracing();
    wimage_gateway::app(AppState::new(config))
}

/// Same-origin POST with a JSON body.
pub fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::HOST, HOST)
        .header(header::ORIGIN, ORIGIN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_image(path: &str, image: Option<&[u8]>) -> Request<Body> {
    let boundary = "wimage-boundary";
    let mut body = Vec::new();
    if let Some(image) = image {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"cat.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(image);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n")
            .as_bytes(),
    );

    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::HOST, HOST)
        .header(header::REFERER, format!("{ORIGIN}/"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
