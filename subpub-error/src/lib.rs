//! Error handling for the subpub message bus.
//!
//! - [`BusError`]: everything `subscribe`, `publish` and `close` can fail with.
//! - [`StatusCode`]: numeric codes used to categorize errors for collaborators
//!   (an RPC layer maps them onto its own status values).
//! - [`ErrorExt`]: object-safe helpers shared by every error type.

pub mod ext;
pub mod status_code;
pub mod types;

pub use ext::*;
pub use status_code::*;
pub use types::*;

/// Result alias used throughout the bus API.
pub type SubPubResult<T> = Result<T, BusError>;
