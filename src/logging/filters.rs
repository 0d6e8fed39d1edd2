use tracing_subscriber::EnvFilter;

use super::config::LoggingConfig;

/// `RUST_LOG` wins; otherwise the configured directive; an invalid directive
/// falls back to `info`.
pub(crate) fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    match EnvFilter::try_new(&config.level) {
        Ok(filter) => filter,
        Err(e) => {
            // The subscriber is not installed yet, stderr is all we have.
            eprintln!(
                "Invalid log filter directive '{}': {e}; falling back to 'info'",
                config.level
            );
            EnvFilter::new("info")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        sync::{Arc, Mutex},
    };

    use serial_test::serial;
    use tracing_subscriber::{fmt, prelude::*, registry::Registry};

    use super::*;

    struct VecMakeWriter(Arc<Mutex<Vec<u8>>>);

    impl<'a> fmt::MakeWriter<'a> for VecMakeWriter {
        type Writer = VecWriter;

        fn make_writer(&'a self) -> Self::Writer {
            VecWriter(self.0.clone())
        }
    }

    struct VecWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for VecWriter {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(filter: EnvFilter) -> String {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(VecMakeWriter(buffer.clone()))
            .with_filter(filter);
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("info-event");
            tracing::warn!("warn-event");
        });

        let out = buffer.lock().unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    /// The configured level is applied when `RUST_LOG` is unset.
    #[test]
    #[serial]
    fn test_config_level_used() {
        env::remove_var("RUST_LOG");
        let out = capture(build_filter(&LoggingConfig::default().with_level("warn")));

        assert!(out.contains("warn-event"));
        assert!(!out.contains("info-event"));
    }

    /// `RUST_LOG` overrides the configured level.
    #[test]
    #[serial]
    fn test_rust_log_wins() {
        env::set_var("RUST_LOG", "warn");
        let filter = build_filter(&LoggingConfig::default().with_level("trace"));
        env::remove_var("RUST_LOG");

        let out = capture(filter);
        assert!(!out.contains("info-event"));
    }

    /// A broken directive degrades to `info`.
    #[test]
    #[serial]
    fn test_invalid_directive_falls_back_to_info() {
        env::remove_var("RUST_LOG");
        let out = capture(build_filter(
            &LoggingConfig::default().with_level("not a [valid directive"),
        ));

        assert!(out.contains("info-event"));
        assert!(out.contains("warn-event"));
    }
}
