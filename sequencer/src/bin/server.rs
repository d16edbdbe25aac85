//! Sequencer server binary

use anyhow::Context;
use sequencer::{Config, Sequencer};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting OCC sequencer");

    // Load configuration
    let config = if let Ok(config_path) = std::env::var("OCC_SEQUENCER_CONFIG") {
        info!("Loading config from: {}", config_path);
        Config::from_file(&config_path).context("loading sequencer config")?
    } else {
        info!("Loading config from environment variables");
        Config::from_env().context("reading sequencer environment")?
    };

    let sequencer = Sequencer::start(config).await?;
    info!("Sequencer listening on {}", sequencer.local_addr());

    // Wait for shutdown signal
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }

    sequencer.shutdown().await?;
    Ok(())
}
