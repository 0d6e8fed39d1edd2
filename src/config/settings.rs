use std::path::Path;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::BusConfig;
use crate::logging::LoggingConfig;

/// Prefix of environment overrides, e.g. `SUBPUB_BUS__SHUTDOWN_TIMEOUT_MS`.
pub const ENV_PREFIX: &str = "SUBPUB";

/// Process-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bus: BusConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Defaults overridden by `SUBPUB_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(Config::builder())
    }

    /// Like [`load`](Self::load), with an optional TOML file layered under
    /// the environment. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        Self::build(Config::builder().add_source(file))
    }

    fn build(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let cfg = builder
            // SUBPUB_BUS__QUEUE__CAPACITY -> bus.queue.capacity
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.bus.validate().map_err(ConfigError::Message)?;
        Ok(settings)
    }
}
