use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by a bus and all of its subscriber workers.
#[derive(Debug, Default)]
pub struct BusStats {
    /// Accepted `publish` calls.
    published: AtomicU64,
    /// Handler invocations that returned normally.
    delivered: AtomicU64,
    /// Messages discarded by an overflow policy or enqueued after stop.
    dropped: AtomicU64,
    /// Handler invocations that panicked.
    handler_panics: AtomicU64,
}

/// Point-in-time copy of the bus counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub published: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub handler_panics: u64,
    pub active_subscribers: usize,
    pub subjects: usize,
}

impl BusStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_panic(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn handler_panics(&self) -> u64 {
        self.handler_panics.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(
        &self,
        active_subscribers: usize,
        subjects: usize,
    ) -> StatsSnapshot {
        StatsSnapshot {
            published: self.published(),
            delivered: self.delivered(),
            dropped: self.dropped(),
            handler_panics: self.handler_panics(),
            active_subscribers,
            subjects,
        }
    }
}
