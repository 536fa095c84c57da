//! MindCoach Daemon - mental-wellness backend for exam candidates
//!
//! Serves the `/api/v1` HTTP API: mood, mistake and messenger logs, paintings,
//! reports, and the AI companion features.

use anyhow::Result;
use mindcoachd::{server, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("MindCoach Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    server::run(config).await?;

    info!("Shutting down gracefully");
    Ok(())
}
