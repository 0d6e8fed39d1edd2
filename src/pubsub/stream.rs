use std::{
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;

use super::{Bus, Handler, Message, Subscription};
use crate::SubPubResult;

/// Pull-style subscription: messages are read with [`recv`](Self::recv) or
/// as a [`Stream`] instead of being pushed to a handler.
///
/// Dropping the stream unsubscribes. The stream ends (`None`) once the
/// subscription was stopped and every queued message has been read.
pub struct MessageStream {
    receiver: mpsc::UnboundedReceiver<Message>,
    subscription: Subscription,
}

/// Handler that forwards every message into the stream's channel.
struct Forwarder {
    sender: mpsc::UnboundedSender<Message>,
}

#[async_trait]
impl Handler for Forwarder {
    async fn handle(
        &self,
        message: Message,
    ) {
        // Receiver gone means the stream was dropped; unsubscribe follows.
        let _ = self.sender.send(message);
    }

    fn name(&self) -> &str {
        "stream"
    }
}

impl Bus {
    /// Subscribes to `subject` and returns the messages as a stream.
    ///
    /// Same ordering and error semantics as [`Bus::subscribe`].
    pub fn subscribe_stream(
        &self,
        subject: &str,
    ) -> SubPubResult<MessageStream> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = self.subscribe(subject, Forwarder { sender })?;
        Ok(MessageStream {
            receiver,
            subscription,
        })
    }
}

impl MessageStream {
    /// Next message, or `None` once the subscription has stopped and drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Stream for MessageStream {
    type Item = Message;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("subscription", &self.subscription)
            .finish()
    }
}
