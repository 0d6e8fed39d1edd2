//! Structured logging setup.
//!
//! The library itself only emits `tracing` events. Applications call
//! [`init_logging`] once to install a subscriber with an `EnvFilter`, a
//! console layer and an optional rolling file layer.

pub mod config;
mod filters;
mod formatter;
pub mod handle;
pub mod sinks;

use std::path::PathBuf;

pub use config::{FileLogConfig, LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// # Errors
/// - [`LoggingError::LogDir`] if the file sink directory cannot be created
/// - [`LoggingError::AlreadyInitialized`] if a global subscriber is already
///   set, e.g. on a second call
pub fn init_logging(config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    let env_filter = filters::build_filter(&config);
    let mut layers = Vec::new();

    layers.push(sinks::console::layer(&config));

    let file_guard = match &config.file {
        Some(file) => {
            let (file_layer, guard) = sinks::file::layer(file, config.format)?;
            layers.push(file_layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = ?config.format,
        file = ?config.file.as_ref().map(|f| f.directory.display().to_string()),
        "Logging initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
