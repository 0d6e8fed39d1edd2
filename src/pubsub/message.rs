use std::sync::Arc;

use bytes::Bytes;

/// A published message as seen by a handler.
///
/// Every subscriber of one publish receives a clone of the same message;
/// both fields are reference counted, so cloning never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Subject the message was published to.
    pub subject: Arc<str>,
    /// Opaque payload.
    pub payload: Bytes,
}

impl Message {
    pub fn new(
        subject: impl Into<Arc<str>>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Payload as UTF-8 text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
