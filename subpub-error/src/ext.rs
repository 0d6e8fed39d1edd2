use std::{any::Any, error::Error};

use crate::StatusCode;

/// Extension trait for bus errors (object-safe).
///
/// Collaborators that sit between the bus and the outside world (an RPC
/// server, a bootstrap binary) use it to:
/// - pick a status code,
/// - produce a message that is safe to show a remote client,
/// - produce a detailed message for logs,
/// - attach tags to metrics.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Status code of the error. Defaults to [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Returns the error as [`Any`] so it can be downcast.
    fn as_any(&self) -> &dyn Any;

    /// Message safe to hand to a client.
    ///
    /// Internal errors collapse to `"Internal error"` so implementation
    /// details never leave the process.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal => "Internal error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Detailed message for logs only.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Key/value tags for metrics backends.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Short type name of the error (no module path).
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}
