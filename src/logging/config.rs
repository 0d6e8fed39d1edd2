use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set, e.g. `info` or
    /// `subpub=debug,warn`.
    pub level: String,
    /// Console output format.
    pub format: LogFormat,
    /// Colored console output.
    pub with_ansi: bool,
    /// Daily rolling file sink. Disabled when `None`.
    pub file: Option<FileLogConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    pub directory: PathBuf,
    /// File name prefix; the date is appended by the appender.
    pub prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_ansi: true,
            file: None,
        }
    }
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            prefix: "subpub.log".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_level(
        mut self,
        level: impl Into<String>,
    ) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(
        mut self,
        format: LogFormat,
    ) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(
        mut self,
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        self.file = Some(FileLogConfig {
            directory: directory.into(),
            prefix: prefix.into(),
        });
        self
    }

    pub fn without_ansi(mut self) -> Self {
        self.with_ansi = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Defaults: info, compact, colored, console only.
    #[test]
    fn test_defaults() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LogFormat::Compact);
        assert!(cfg.with_ansi);
        assert!(cfg.file.is_none());
    }

    #[test]
    fn test_with_file() {
        let cfg = LoggingConfig::default()
            .with_level("debug")
            .with_format(LogFormat::Json)
            .without_ansi()
            .with_file("/tmp/x", "app.log");

        assert_eq!(cfg.level, "debug");
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(!cfg.with_ansi);
        assert_eq!(cfg.file.unwrap().prefix, "app.log");
    }

    /// Formats use lowercase names in config sources.
    #[test]
    fn test_format_names() {
        let cfg = config::Config::builder()
            .set_override("format", "pretty")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(cfg.get::<LogFormat>("format").unwrap(), LogFormat::Pretty);
    }
}
