//! Replica server binary

use anyhow::Context;
use replica::{Config, Replica};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting OCC replica");

    // Load configuration
    let config = if let Ok(config_path) = std::env::var("OCC_REPLICA_CONFIG") {
        info!("Loading config from: {}", config_path);
        Config::from_file(&config_path).context("loading replica config")?
    } else {
        info!("Loading config from environment variables");
        Config::from_env().context("reading replica environment")?
    };

    let replica = Replica::start(config).await?;
    info!("Replica listening on {}", replica.local_addr());

    // Wait for shutdown signal
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }

    replica.shutdown().await?;
    info!("Replica stopped");
    Ok(())
}
