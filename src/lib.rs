//! In-process publish/subscribe bus.
//!
//! Publishers send byte payloads to named subjects; every subscriber of the
//! subject receives each message through its own FIFO queue and worker task,
//! so a slow handler never blocks the publisher or other subscribers.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use subpub::{Bus, Message};
//!
//! # async fn demo() -> Result<(), subpub::BusError> {
//! let bus = Bus::new();
//! let sub = bus.subscribe("orders", |msg: Message| async move {
//!     println!("{}: {:?}", msg.subject(), msg.payload);
//! })?;
//!
//! bus.publish("orders", "created")?;
//! sub.unsubscribe();
//! bus.close(Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

/// Bus and logging settings (env vars and TOML).
pub mod config;
/// Tracing subscriber setup: filters, console and file sinks.
pub mod logging;
/// Bus, Subscription, Handler, Message.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Configuration.
pub use config::{BusConfig, OverflowPolicy, QueueConfig, Settings};
/// Logging entry point.
pub use logging::{init_logging, LoggingConfig, LoggingError, LoggingHandle};
/// Pub/Sub API.
pub use pubsub::{
    sync_handler, Bus, BusBuilder, Handler, Message, MessageStream, StatsSnapshot, SubscriberId,
    Subscription, SyncHandler,
};
/// Error types and status codes.
pub use subpub_error::{BusError, ErrorExt, StatusCode, SubPubResult};
