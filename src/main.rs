use std::sync::Arc;

use anyhow::Error;
use led_driver::{gateway, prelude::*};
use log::info;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing, which also picks up `log` records
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("led_driver=info,tower_http=info")),
        )
        .init();

    let config = Config::load()?;
    let port = config.port;

    let driver = Arc::new(Driver::open(config)?);
    driver.start()?;

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;

    info!("LED Driver running on port {}", port);
    info!(
        "Hardware: {} LEDs on pin {}",
        driver.config().led_count,
        driver.config().pin
    );
    info!("Press Ctrl+C to shutdown");

    // Blank the strip as soon as a signal arrives, then let the server drain.
    let shutdown_driver = driver.clone();
    axum::serve(listener, gateway::router(driver))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_driver.shutdown().await;
        })
        .await?;

    info!("LED Driver stopped");
    Ok(())
}
