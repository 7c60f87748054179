//! WebApp Controller
//!
//! Provisions the tutorial web app from its OpenShift template and keeps the
//! running app's environment in line with the `WebApp` resource.

mod backoff;
mod catalog;
mod config;
mod controller;
mod error;
mod metrics;
mod reconciler;
mod template;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting WebApp Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace);
    info!(
        "  Catalog: {}",
        config
            .catalog_path
            .as_ref()
            .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
    );
    info!("  Resync period: {:?}", config.resync_period);
    info!("  Metrics address: {}", config.metrics_addr);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
