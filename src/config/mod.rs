//! Configuration: bus tuning and logging, loaded from the environment and an
//! optional TOML file.

pub mod bus;
pub mod settings;

pub use bus::{BusConfig, OverflowPolicy, QueueConfig};
pub use settings::Settings;
