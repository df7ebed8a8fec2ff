mod article;
mod config;
mod document;
mod error;
mod llm;
mod provider;
mod routes;
mod state;
mod translate;
mod views;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

const DEFAULT_CONFIG_PATH: &str = "conf.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("multilingual_translator=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // The file is optional, environment variables win over it
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration (file: {})", config_path))?;
    info!("Loaded configuration: {:?}", config);

    let host = config.server.host.clone();
    let port = config.server.port;

    let app_state = AppState::new(config);
    let app = routes::app(app_state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
