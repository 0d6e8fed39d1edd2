//! Subscriber worker: one FIFO inbox drained by one background task.
//!
//! ```text
//! publish ──► enqueue ──► [inbox] ──► worker ──► handler.handle(msg)
//!                            │           └─────► panic → logged, continue
//!                         stop ──────────► drain remaining, then finish
//! ```
//!
//! ## States
//! - **Idle**: inbox empty, the worker waits on the wake signal.
//! - **Draining**: the worker pops the head and awaits the handler, until the
//!   inbox is empty, whether or not stop was requested meanwhile.
//! - **Stopped**: inbox empty and stop requested. The completion signal is
//!   raised and nothing is delivered afterwards.
//!
//! The stop flag lives under the same lock as the queue, so an enqueue either
//! lands before the stop (and is drained) or is dropped.

use std::{
    collections::VecDeque,
    fmt,
    panic::AssertUnwindSafe,
    sync::Arc,
};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, trace, warn};

use super::{BusStats, Handler, Message};
use crate::config::{OverflowPolicy, QueueConfig};

/// Identifier of a subscriber, unique within its bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl SubscriberId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Result of handing a message to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Enqueued {
    Accepted,
    /// Accepted after evicting the oldest queued message.
    Evicted,
    /// Discarded: the queue was full (drop-newest) or stop was requested.
    Dropped,
}

#[derive(Default)]
struct Inbox {
    messages: VecDeque<Message>,
    stop_requested: bool,
}

enum Step {
    Deliver(Message),
    Wait,
    Finish,
}

pub(crate) struct Subscriber {
    id: SubscriberId,
    subject: Arc<str>,
    handler_name: String,
    queue: QueueConfig,
    inbox: Mutex<Inbox>,
    wake: Notify,
    finished: watch::Sender<bool>,
    stats: Arc<BusStats>,
}

impl Subscriber {
    pub(crate) fn new(
        id: SubscriberId,
        subject: Arc<str>,
        handler_name: impl Into<String>,
        queue: QueueConfig,
        stats: Arc<BusStats>,
    ) -> Self {
        let (finished, _) = watch::channel(false);
        Self {
            id,
            subject,
            handler_name: handler_name.into(),
            queue,
            inbox: Mutex::new(Inbox::default()),
            wake: Notify::new(),
            finished,
            stats,
        }
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn subject(&self) -> &Arc<str> {
        &self.subject
    }

    /// Appends a message without waiting for the handler.
    pub(crate) fn enqueue(
        &self,
        message: Message,
    ) -> Enqueued {
        let outcome = {
            let mut inbox = self.inbox.lock();
            if inbox.stop_requested {
                Enqueued::Dropped
            } else {
                let outcome = match self.queue.capacity {
                    Some(cap) if inbox.messages.len() >= cap => match self.queue.overflow {
                        OverflowPolicy::DropNewest => Enqueued::Dropped,
                        OverflowPolicy::DropOldest => {
                            inbox.messages.pop_front();
                            Enqueued::Evicted
                        }
                    },
                    _ => Enqueued::Accepted,
                };
                if outcome != Enqueued::Dropped {
                    inbox.messages.push_back(message);
                    // Idle -> Draining. A stored permit covers a worker that
                    // has not reached its wait yet.
                    if inbox.messages.len() == 1 {
                        self.wake.notify_one();
                    }
                }
                outcome
            }
        };

        match outcome {
            Enqueued::Accepted => {}
            Enqueued::Evicted => {
                self.stats.record_dropped();
                warn!(
                    subject = %self.subject,
                    subscriber = %self.id,
                    "Subscriber queue full, evicted oldest message"
                );
            }
            Enqueued::Dropped => {
                self.stats.record_dropped();
                if self.is_stop_requested() {
                    trace!(subscriber = %self.id, "Message for stopped subscriber dropped");
                } else {
                    warn!(
                        subject = %self.subject,
                        subscriber = %self.id,
                        "Subscriber queue full, dropped incoming message"
                    );
                }
            }
        }
        outcome
    }

    /// Raises the stop request. Returns `false` if it was already raised.
    ///
    /// Queued messages are still delivered before the worker finishes.
    pub(crate) fn request_stop(&self) -> bool {
        {
            let mut inbox = self.inbox.lock();
            if inbox.stop_requested {
                return false;
            }
            inbox.stop_requested = true;
        }
        self.wake.notify_one();
        debug!(subject = %self.subject, subscriber = %self.id, "Subscriber stop requested");
        true
    }

    pub(crate) fn is_stop_requested(&self) -> bool {
        self.inbox.lock().stop_requested
    }

    pub(crate) fn is_finished(&self) -> bool {
        *self.finished.borrow()
    }

    pub(crate) fn pending(&self) -> usize {
        self.inbox.lock().messages.len()
    }

    /// Resolves once the worker has finished.
    pub(crate) async fn wait_finished(&self) {
        let mut rx = self.finished.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Worker loop. Runs until stop is requested and the inbox is empty.
    pub(crate) async fn run(
        self: Arc<Self>,
        handler: Box<dyn Handler>,
    ) {
        // Completion is signalled even if the task is dropped mid-flight
        // (runtime shutdown).
        let _finished = FinishGuard(&self.finished);

        trace!(subject = %self.subject, subscriber = %self.id, "Subscriber worker started");

        loop {
            let step = {
                let mut inbox = self.inbox.lock();
                match inbox.messages.pop_front() {
                    Some(message) => Step::Deliver(message),
                    None if inbox.stop_requested => Step::Finish,
                    None => Step::Wait,
                }
            };

            match step {
                Step::Deliver(message) => self.deliver(handler.as_ref(), message).await,
                Step::Wait => self.wake.notified().await,
                Step::Finish => break,
            }
        }

        debug!(subject = %self.subject, subscriber = %self.id, "Subscriber worker finished");
    }

    async fn deliver(
        &self,
        handler: &dyn Handler,
        message: Message,
    ) {
        trace!(subject = %self.subject, subscriber = %self.id, "Delivering message");

        match AssertUnwindSafe(handler.handle(message)).catch_unwind().await {
            Ok(()) => self.stats.record_delivered(),
            Err(panic) => {
                self.stats.record_handler_panic();
                error!(
                    subject = %self.subject,
                    subscriber = %self.id,
                    handler = %self.handler_name,
                    panic = %panic_message(panic.as_ref()),
                    "Handler panicked, continuing with next message"
                );
            }
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("subject", &self.subject)
            .field("handler", &self.handler_name)
            .field("pending", &self.pending())
            .field("stop_requested", &self.is_stop_requested())
            .field("finished", &self.is_finished())
            .finish()
    }
}

struct FinishGuard<'a>(&'a watch::Sender<bool>);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
