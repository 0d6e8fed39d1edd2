use std::{
    fmt,
    sync::{Arc, Weak},
};

use super::{bus::BusInner, subscriber::Subscriber, SubscriberId};

/// Handle returned by [`Bus::subscribe`](super::Bus::subscribe).
///
/// Dropping the handle does **not** unsubscribe: the subscriber stays
/// registered until [`unsubscribe`](Self::unsubscribe) is called or the bus
/// is closed.
pub struct Subscription {
    subscriber: Arc<Subscriber>,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub(crate) fn new(
        subscriber: Arc<Subscriber>,
        bus: Weak<BusInner>,
    ) -> Self {
        Self { subscriber, bus }
    }

    /// Removes the subscriber from its subject and asks its worker to stop.
    ///
    /// Returns without waiting for the worker: messages already queued are
    /// still delivered, no new message is queued after this returns.
    /// Calling it again, or after the bus closed, does nothing.
    pub fn unsubscribe(&self) {
        match self.bus.upgrade() {
            Some(bus) => bus.unsubscribe(&self.subscriber),
            // The bus is gone, nothing can publish to us anymore.
            None => {
                self.subscriber.request_stop();
            }
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    /// Subject this subscription was registered under.
    pub fn subject(&self) -> &str {
        self.subscriber.subject()
    }

    /// `false` once unsubscribed or closed by the bus.
    pub fn is_active(&self) -> bool {
        !self.subscriber.is_stop_requested()
    }

    /// `true` once the worker delivered its last message and exited.
    pub fn is_finished(&self) -> bool {
        self.subscriber.is_finished()
    }

    /// Messages queued but not yet handed to the handler.
    pub fn pending(&self) -> usize {
        self.subscriber.pending()
    }

    /// Waits until the worker has drained its queue and exited.
    ///
    /// Only resolves after a stop was requested (unsubscribe or close).
    pub async fn finished(&self) {
        self.subscriber.wait_finished().await
    }
}

impl fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("subject", &self.subject())
            .field("active", &self.is_active())
            .finish()
    }
}
