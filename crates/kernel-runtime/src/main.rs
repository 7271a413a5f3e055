//! # Collab-Kernel Node
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file named by `CK_CONFIG`, then `CK_*` variables)
//! 2. Initialize logging
//! 3. Build the container (bus, authenticator, gateway, handlers)
//! 4. Publish `platform.started`
//! 5. Wait for Ctrl+C
//! 6. Publish `platform.shutdown` and drain the bus

use anyhow::{Context, Result};
use kernel_runtime::config::CONFIG_PATH_VAR;
use kernel_runtime::telemetry::init_logging;
use kernel_runtime::{KernelConfig, KernelContainer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = KernelConfig::load().context("Failed to load configuration")?;
    init_logging(&config.telemetry).context("Failed to initialize logging")?;

    info!("===========================================");
    info!("  Collab-Kernel v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => info!(%path, "Loaded configuration file"),
        Err(_) => info!("No {CONFIG_PATH_VAR} set, using defaults and environment"),
    }

    if config.credentials.is_empty() {
        warn!("No credentials configured, every login will be rejected");
    }

    let container = KernelContainer::new(config).context("Failed to build kernel container")?;
    container.start();

    info!("Kernel is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    // close() joins the dispatch thread
    tokio::task::block_in_place(|| container.shutdown());

    Ok(())
}
