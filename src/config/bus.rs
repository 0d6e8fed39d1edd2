use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default time `Bus::shutdown` waits for workers to drain.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;

/// Bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Deadline used by `Bus::shutdown`, in milliseconds.
    pub shutdown_timeout_ms: u64,
    /// Per-subscriber queue settings.
    pub queue: QueueConfig,
}

/// Per-subscriber queue settings.
///
/// `capacity = None` keeps queues unbounded: a slow handler lets its backlog
/// grow without limit. With a capacity, a full queue applies `overflow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: Option<usize>,
    pub overflow: OverflowPolicy,
}

/// What to do with a message published into a full subscriber queue.
///
/// Both policies keep `publish` non-blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the incoming message.
    #[default]
    DropNewest,
    /// Evict the oldest queued message and append the incoming one.
    DropOldest,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            queue: QueueConfig::default(),
        }
    }
}

impl BusConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn with_shutdown_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.shutdown_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_queue(
        mut self,
        queue: QueueConfig,
    ) -> Self {
        self.queue = queue;
        self
    }

    /// Rejects settings the bus cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue.capacity == Some(0) {
            return Err("bus.queue.capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl QueueConfig {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(
        capacity: usize,
        overflow: OverflowPolicy,
    ) -> Self {
        Self {
            capacity: Some(capacity),
            overflow,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.capacity.is_some()
    }
}
