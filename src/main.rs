use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use wimage_gateway::config::{Args, Config};
use wimage_gateway::state::AppState;

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // parse cli arguments
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let addr = format!("{}:{}", args.host, args.port);
    let config = Config::from(args);

    info!(
        "Rate limit: {} requests per {} seconds per client and endpoint",
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs()
    );
    let keys = &config.server_keys;
    info!(
        moondream = keys.moondream.is_some(),
        openrouter = keys.openrouter.is_some(),
        openai = keys.openai.is_some(),
        "server-side keys configured"
    );

    // creating shared state
    let state = AppState::new(config);
    let app = wimage_gateway::app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
