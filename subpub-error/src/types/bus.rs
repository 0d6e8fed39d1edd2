use std::{any::Any, time::Duration};

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Errors returned by the bus to its immediate caller.
///
/// None of them is retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BusError {
    /// The bus has been closed. Permanent for this bus instance.
    #[error("bus is closed")]
    Closed,

    /// `close` gave up waiting. The close itself took effect and the
    /// remaining workers keep draining in the background.
    #[error("close deadline of {timeout:?} exceeded: {pending} of {total} subscribers still draining")]
    DeadlineExceeded {
        pending: usize,
        total: usize,
        timeout: Duration,
    },

    /// The subject cannot be subscribed to.
    #[error("invalid subject: {reason}")]
    InvalidSubject { reason: String },

    /// The bus configuration cannot be used, e.g. a zero queue capacity.
    #[error("invalid bus configuration: {reason}")]
    InvalidConfig { reason: String },

    /// No tokio runtime to spawn the subscriber worker on.
    #[error("no tokio runtime available to run the subscriber worker")]
    NoRuntime,
}

impl BusError {
    pub fn invalid_subject(reason: impl Into<String>) -> Self {
        Self::InvalidSubject {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}

impl ErrorExt for BusError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Closed => StatusCode::Closed,
            Self::DeadlineExceeded { .. } => StatusCode::DeadlineExceeded,
            Self::InvalidSubject { .. } | Self::InvalidConfig { .. } => StatusCode::InvalidArgs,
            Self::NoRuntime => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::Closed => "Bus closed".to_string(),
            Self::DeadlineExceeded { .. } => "Shutdown deadline exceeded".to_string(),
            Self::InvalidSubject { reason } => format!("Invalid subject: {reason}"),
            Self::InvalidConfig { reason } => format!("Invalid configuration: {reason}"),
            Self::NoRuntime => "Internal error".to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "bus".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        if let Self::DeadlineExceeded { pending, .. } = self {
            tags.push(("pending_subscribers", pending.to_string()));
        }

        tags
    }
}
