use anyhow::{Context, anyhow};
use sbot::api::{AppState, create_router};
use sbot::core::config::AppConfig;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sbot::setup_logging();

    let config = AppConfig::from_env().map_err(|e| anyhow!("Config error: {e}"))?;
    let state = AppState::from_config(&config).context("Failed to initialize collaborators")?;
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, version = env!("CARGO_PKG_VERSION"), "sbot API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}
