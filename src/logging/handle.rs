use std::time::Instant;

use tracing_appender::non_blocking::WorkerGuard;

/// Keeps logging sinks alive.
///
/// Holds the non-blocking file writer's guard: buffered lines are written
/// when the guard is dropped, so keep the handle until the process exits and
/// call [`shutdown`](Self::shutdown) last.
#[derive(Debug)]
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    pub(crate) fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self { file_guard }
    }

    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Flushes and closes the file sink.
    pub fn shutdown(mut self) {
        let Some(guard) = self.file_guard.take() else {
            return;
        };

        tracing::info!("Flushing log file");
        let started = Instant::now();
        drop(guard);

        // The file writer is gone, this line only reaches the console.
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Logging shutdown completed"
        );
    }
}
