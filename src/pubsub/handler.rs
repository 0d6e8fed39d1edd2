//! Message handlers.
//!
//! A [`Handler`] is invoked once per delivered message, strictly one
//! invocation at a time per subscriber. Two ways to provide one:
//!
//! - any async closure `Fn(Message) -> impl Future<Output = ()>`;
//! - a blocking closure wrapped with [`sync_handler`], which runs every
//!   invocation on tokio's blocking pool.
//!
//! ```rust,no_run
//! use subpub::{sync_handler, Bus, Message};
//!
//! # async fn example() -> Result<(), subpub::BusError> {
//! let bus = Bus::new();
//!
//! bus.subscribe("news", |msg: Message| async move {
//!     println!("async: {:?}", msg.as_str());
//! })?;
//!
//! bus.subscribe(
//!     "news",
//!     sync_handler(|msg: Message| {
//!         std::thread::sleep(std::time::Duration::from_millis(10));
//!         println!("blocking: {:?}", msg.as_str());
//!     }),
//! )?;
//! # Ok(())
//! # }
//! ```

use std::{future::Future, sync::Arc};

use async_trait::async_trait;

use super::Message;

/// Callback invoked for each message delivered to one subscriber.
///
/// A panic inside `handle` is caught by the subscriber worker, logged, and
/// the worker moves on to the next queued message.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(
        &self,
        message: Message,
    );

    /// Name used in logs.
    fn name(&self) -> &str {
        "anonymous"
    }
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(
        &self,
        message: Message,
    ) {
        (self)(message).await
    }
}

/// Adapter for blocking callbacks. See [`sync_handler`].
pub struct SyncHandler<F> {
    inner: Arc<F>,
    name: &'static str,
}

/// Wraps a blocking `Fn(Message)` so it can be used as a [`Handler`].
///
/// Each invocation runs via `spawn_blocking` and is awaited before the next
/// message is taken, so ordering per subscriber is unchanged.
pub fn sync_handler<F>(f: F) -> SyncHandler<F>
where
    F: Fn(Message) + Send + Sync + 'static,
{
    SyncHandler {
        inner: Arc::new(f),
        name: "sync",
    }
}

impl<F> SyncHandler<F> {
    pub fn named(
        mut self,
        name: &'static str,
    ) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<F> Handler for SyncHandler<F>
where
    F: Fn(Message) + Send + Sync + 'static,
{
    async fn handle(
        &self,
        message: Message,
    ) {
        let f = Arc::clone(&self.inner);
        if let Err(err) = tokio::task::spawn_blocking(move || f(message)).await {
            // Re-raise so the worker's panic isolation sees it.
            if err.is_panic() {
                std::panic::resume_unwind(err.into_panic());
            }
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}
