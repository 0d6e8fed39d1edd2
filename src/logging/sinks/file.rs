use std::fs;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{layer::Layer, registry::LookupSpan};

use crate::logging::{
    config::{FileLogConfig, LogFormat},
    formatter, LoggingError,
};

/// Daily rolling file layer behind a non-blocking writer.
///
/// The returned guard flushes the writer on drop and must outlive logging.
/// Files are written without ANSI colors.
pub fn layer<S>(
    config: &FileLogConfig,
    format: LogFormat,
) -> Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard), LoggingError>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fs::create_dir_all(&config.directory).map_err(|source| LoggingError::LogDir {
        path: config.directory.clone(),
        source,
    })?;

    let appender = rolling::daily(&config.directory, &config.prefix);
    let (writer, guard) = non_blocking(appender);

    Ok((formatter::build_layer(format, false, writer), guard))
}
