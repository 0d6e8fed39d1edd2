use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use bytes::Bytes;
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::{runtime::Handle, time::Instant};
use tracing::{debug, info, trace, warn};

use super::{
    subscriber::{Subscriber, SubscriberId},
    BusStats, Handler, Message, StatsSnapshot, Subscription,
};
use crate::{
    config::{BusConfig, QueueConfig},
    BusError, SubPubResult,
};

/// Deadline used when `now + timeout` does not fit in an `Instant`
/// (about 30 years, the same clamp tokio applies to its timers).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// In-process publish/subscribe bus.
///
/// Supports:
/// - Any number of subscribers per subject, each with its own FIFO queue and
///   worker task
/// - Non-blocking fan-out on `publish`
/// - Graceful `close`: stop accepting work, drain every queue, wait up to a
///   deadline
///
/// `Bus` is a cheap handle; clones share the same registry.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

/// Builder for [`Bus`].
#[derive(Debug, Default)]
pub struct BusBuilder {
    config: BusConfig,
    runtime: Option<Handle>,
}

pub(crate) struct BusInner {
    registry: RwLock<Registry>,
    config: BusConfig,
    stats: Arc<BusStats>,
    next_id: AtomicU64,
    runtime: Option<Handle>,
}

/// Subject -> subscribers, in subscription order.
#[derive(Default)]
struct Registry {
    closed: bool,
    subjects: HashMap<Arc<str>, Vec<Arc<Subscriber>>>,
}

impl Bus {
    /// Creates a bus with the default configuration.
    ///
    /// Workers are spawned on the tokio runtime current at `subscribe` time.
    pub fn new() -> Self {
        // The default configuration is always valid.
        Self::builder().assemble()
    }

    /// # Errors
    /// [`BusError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(config: BusConfig) -> SubPubResult<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> BusBuilder {
        BusBuilder::default()
    }

    /// Registers `handler` for `subject` and starts its worker.
    ///
    /// Every message published to `subject` afterwards is delivered to the
    /// handler, one at a time, in publish order. Several subscriptions to one
    /// subject each get their own copy.
    ///
    /// # Errors
    /// - [`BusError::Closed`] once the bus has been closed
    /// - [`BusError::InvalidSubject`] for an empty subject
    /// - [`BusError::NoRuntime`] outside a tokio runtime, unless the bus was
    ///   built with [`BusBuilder::runtime`]
    pub fn subscribe<H: Handler>(
        &self,
        subject: &str,
        handler: H,
    ) -> SubPubResult<Subscription> {
        if subject.is_empty() {
            return Err(BusError::invalid_subject("subject must not be empty"));
        }

        let mut registry = self.inner.registry.write();
        if registry.closed {
            return Err(BusError::Closed);
        }
        let runtime = self.inner.runtime()?;

        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let subject: Arc<str> = registry
            .subjects
            .get_key_value(subject)
            .map(|(key, _)| Arc::clone(key))
            .unwrap_or_else(|| Arc::from(subject));
        let subscriber = Arc::new(Subscriber::new(
            id,
            Arc::clone(&subject),
            handler.name(),
            self.inner.config.queue,
            Arc::clone(&self.inner.stats),
        ));

        runtime.spawn(Arc::clone(&subscriber).run(Box::new(handler)));
        registry
            .subjects
            .entry(Arc::clone(&subject))
            .or_default()
            .push(Arc::clone(&subscriber));
        drop(registry);

        debug!(subject = %subject, subscriber = %id, "Subscribed");
        Ok(Subscription::new(subscriber, Arc::downgrade(&self.inner)))
    }

    /// Publishes `payload` to every current subscriber of `subject`.
    ///
    /// Never waits for a handler. Publishing to a subject without
    /// subscribers succeeds and the message is discarded: nothing is kept
    /// for future subscribers.
    ///
    /// # Errors
    /// [`BusError::Closed`] once the bus has been closed.
    pub fn publish(
        &self,
        subject: &str,
        payload: impl Into<Bytes>,
    ) -> SubPubResult<()> {
        let payload = payload.into();

        let registry = self.inner.registry.read();
        if registry.closed {
            return Err(BusError::Closed);
        }
        self.inner.stats.record_published();

        let Some((key, subscribers)) = registry.subjects.get_key_value(subject) else {
            trace!(subject, "No subscribers, message discarded");
            return Ok(());
        };

        let message = Message {
            subject: Arc::clone(key),
            payload,
        };
        for subscriber in subscribers {
            subscriber.enqueue(message.clone());
        }

        trace!(subject, subscribers = subscribers.len(), "Message published");
        Ok(())
    }

    /// Closes the bus and waits up to `timeout` for every worker to drain.
    ///
    /// See [`close_by`](Self::close_by).
    pub async fn close(
        &self,
        timeout: Duration,
    ) -> SubPubResult<()> {
        self.close_within(deadline_after(timeout), timeout).await
    }

    /// Closes the bus using the configured shutdown timeout.
    pub async fn shutdown(&self) -> SubPubResult<()> {
        self.close(self.inner.config.shutdown_timeout()).await
    }

    /// Closes the bus and waits until `deadline` for every worker to drain.
    ///
    /// 1. Marks the bus closed: later `subscribe`/`publish` calls fail with
    ///    [`BusError::Closed`].
    /// 2. Takes every subscriber out of the registry and asks each to stop.
    /// 3. Waits for the workers. Handlers are never aborted.
    ///
    /// A second call returns `Ok(())` immediately.
    ///
    /// # Errors
    /// [`BusError::DeadlineExceeded`] if some worker was still draining at the
    /// deadline. The close still took effect; those workers finish in the
    /// background.
    pub async fn close_by(
        &self,
        deadline: Instant,
    ) -> SubPubResult<()> {
        let timeout = deadline.saturating_duration_since(Instant::now());
        self.close_within(deadline, timeout).await
    }

    /// `timeout` is only reported back in [`BusError::DeadlineExceeded`].
    async fn close_within(
        &self,
        deadline: Instant,
        timeout: Duration,
    ) -> SubPubResult<()> {
        let started = Instant::now();

        let Some(subscribers) = self.inner.begin_close() else {
            debug!("Bus already closed");
            return Ok(());
        };
        let total = subscribers.len();
        info!(subscribers = total, "Closing bus");

        for subscriber in &subscribers {
            subscriber.request_stop();
        }

        let drained = join_all(subscribers.iter().map(|s| s.wait_finished()));
        if tokio::time::timeout_at(deadline, drained).await.is_ok() {
            info!(
                subscribers = total,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Bus closed"
            );
            return Ok(());
        }

        let pending = subscribers.iter().filter(|s| !s.is_finished()).count();
        if pending == 0 {
            info!(subscribers = total, "Bus closed");
            return Ok(());
        }

        let err = BusError::DeadlineExceeded {
            pending,
            total,
            timeout,
        };
        warn!(
            pending,
            total,
            "Close deadline exceeded, remaining subscribers keep draining in background"
        );
        Err(err)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.registry.read().closed
    }

    /// Number of subscribers currently registered for `subject`.
    pub fn subscriber_count(
        &self,
        subject: &str,
    ) -> usize {
        self.inner
            .registry
            .read()
            .subjects
            .get(subject)
            .map_or(0, Vec::len)
    }

    /// Subjects with at least one subscriber.
    pub fn subjects(&self) -> Vec<String> {
        self.inner
            .registry
            .read()
            .subjects
            .keys()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        let registry = self.inner.registry.read();
        let active = registry.subjects.values().map(Vec::len).sum();
        self.inner.stats.snapshot(active, registry.subjects.len())
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}

impl BusBuilder {
    pub fn config(
        mut self,
        config: BusConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn queue(
        mut self,
        queue: QueueConfig,
    ) -> Self {
        self.config.queue = queue;
        self
    }

    pub fn shutdown_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config = self.config.with_shutdown_timeout(timeout);
        self
    }

    /// Runtime to spawn workers on, instead of the one current at
    /// `subscribe` time.
    pub fn runtime(
        mut self,
        handle: Handle,
    ) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// # Errors
    /// [`BusError::InvalidConfig`] for a zero queue capacity.
    pub fn build(self) -> SubPubResult<Bus> {
        self.config.validate().map_err(BusError::invalid_config)?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Bus {
        Bus {
            inner: Arc::new(BusInner {
                registry: RwLock::new(Registry::default()),
                config: self.config,
                stats: Arc::new(BusStats::new()),
                next_id: AtomicU64::new(1),
                runtime: self.runtime,
            }),
        }
    }
}

impl BusInner {
    fn runtime(&self) -> SubPubResult<Handle> {
        match &self.runtime {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| BusError::NoRuntime),
        }
    }

    /// Flips `closed` and takes ownership of every subscriber.
    /// `None` if the bus was already closed.
    fn begin_close(&self) -> Option<Vec<Arc<Subscriber>>> {
        let mut registry = self.registry.write();
        if registry.closed {
            return None;
        }
        registry.closed = true;
        Some(
            registry
                .subjects
                .drain()
                .flat_map(|(_, subscribers)| subscribers)
                .collect(),
        )
    }

    /// Removes `subscriber` from its subject and raises its stop request.
    pub(crate) fn unsubscribe(
        &self,
        subscriber: &Arc<Subscriber>,
    ) {
        let mut registry = self.registry.write();
        if subscriber.is_stop_requested() {
            return;
        }

        let subject = subscriber.subject();
        let now_empty = match registry.subjects.get_mut(subject) {
            Some(subscribers) => {
                subscribers.retain(|s| !Arc::ptr_eq(s, subscriber));
                subscribers.is_empty()
            }
            None => false,
        };
        if now_empty {
            registry.subjects.remove(subject);
        }

        subscriber.request_stop();
        drop(registry);

        debug!(subject = %subject, subscriber = %subscriber.id(), "Unsubscribed");
    }
}

/// The last `Bus` handle is gone and nothing can publish anymore: stop every
/// remaining worker so it drains its queue and exits.
impl Drop for BusInner {
    fn drop(&mut self) {
        let registry = self.registry.get_mut();
        if registry.subjects.is_empty() {
            return;
        }

        let mut stopped = 0usize;
        for (_, subscribers) in registry.subjects.drain() {
            for subscriber in subscribers {
                subscriber.request_stop();
                stopped += 1;
            }
        }
        debug!(subscribers = stopped, "Bus dropped without close, stopping workers");
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}
