//! Hooks service binary.
//!
//! Standalone HTTP service relaying GitLab webhooks to Asana.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hooks::{server, AsanaClient, Config, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("hooks=info".parse()?))
        .init();

    info!("Starting hooks service...");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        tokens = config.gitlab_secret_tokens.len(),
        last_commit_field = %config.last_commit_field_name,
        message_field = %config.message_field_name,
        "Configuration loaded"
    );

    let asana = AsanaClient::with_url(&config.asana_api_key, &config.asana_api_url)
        .context("Failed to create Asana client")?;

    let state = server::AppState {
        orchestrator: Orchestrator::new(Arc::new(asana), &config),
        config: Arc::new(config),
    };
    let port = state.config.port;

    let app = server::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port, "Hooks service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
