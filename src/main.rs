//! Bootstrap binary: hosts one bus for in-process collaborators until a
//! shutdown signal, then closes it within the configured deadline.

use anyhow::Context;
use subpub::{init_logging, Bus, BusError, Settings};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load_from(&path).with_context(|| format!("loading {path}"))?,
        None => Settings::load().context("loading settings from environment")?,
    };

    let logging = init_logging(settings.logging.clone()).context("initializing logging")?;

    let bus = Bus::with_config(settings.bus.clone()).context("building bus")?;
    info!(
        shutdown_timeout_ms = settings.bus.shutdown_timeout_ms,
        queue_capacity = ?settings.bus.queue.capacity,
        "Bus started, waiting for shutdown signal"
    );

    wait_for_shutdown_signal()
        .await
        .context("installing signal handlers")?;
    info!("Shutdown signal received");

    match bus.shutdown().await {
        Ok(()) => {}
        Err(BusError::DeadlineExceeded { pending, total, timeout }) => {
            warn!(pending, total, ?timeout, "Subscribers still draining at exit");
        }
        Err(e) => return Err(e.into()),
    }

    logging.shutdown();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
