use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use linkfeed::api::ApiClient;
use linkfeed::config::{Cli, Config};
use linkfeed::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    tracing::info!("Remote API: {}", config.api.base_url);

    let api = ApiClient::new(&config.api)?;
    let state = AppState::new(config.clone(), api);

    let app = linkfeed::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
