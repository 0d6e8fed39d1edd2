//! In-process publish/subscribe.
//!
//! - `bus`: subject registry, non-blocking fan-out and graceful close.
//! - `subscriber` (private): per-subscriber FIFO queue and worker task.
//! - `subscription`: handle used to unsubscribe.
//! - `handler`: the callback trait invoked by workers.
//! - `message`: subject plus payload as delivered to handlers.
//! - `stream`: pull-style subscriptions.
//! - `stats`: bus-wide counters.

mod bus;
pub mod handler;
pub mod message;
pub mod stats;
mod stream;
mod subscriber;
mod subscription;

pub use bus::{Bus, BusBuilder};
pub use handler::{sync_handler, Handler, SyncHandler};
pub use message::Message;
pub use stats::{BusStats, StatsSnapshot};
pub use stream::MessageStream;
pub use subscriber::SubscriberId;
pub use subscription::Subscription;
