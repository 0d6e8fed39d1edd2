use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Status codes used to categorize bus errors.
///
/// # Ranges:
/// - 0xxx: Success
/// - 1xxx: General errors
/// - 2xxx: Lifecycle (closed bus, expired deadlines)
/// - 3xxx: Delivery
///
/// `num_enum::TryFromPrimitive` provides `TryFrom<u32>`, which collaborators
/// use when a code travels over their own wire format.
#[cfg_attr(feature = "serde", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Success ===
    Success = 0,

    // === 1xxx: General ===
    Unknown = 1000,
    Internal = 1001,
    InvalidArgs = 1002,
    Unsupported = 1003,

    // === 2xxx: Lifecycle ===
    Closed = 2000,
    DeadlineExceeded = 2001,
    Unavailable = 2002,

    // === 3xxx: Delivery ===
    Dropped = 3000,
    HandlerPanicked = 3001,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Numeric value of the code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Looks up a code by its numeric value.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Whether retrying the same call can succeed.
    ///
    /// A closed bus is permanently done, so `Closed` is never retryable. An
    /// expired close deadline is: the workers keep draining in the background.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Unavailable)
    }

    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// The caller passed something the bus cannot accept.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidArgs | Self::Unsupported)
    }

    /// Lifecycle range (2xxx).
    pub fn is_lifecycle(&self) -> bool {
        (2000..=2999).contains(&self.code())
    }

    /// Recommended log level for an error carrying this code.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::Closed | Self::InvalidArgs => LogLevel::Debug,
            Self::Dropped => LogLevel::Info,
            Self::DeadlineExceeded | Self::Unavailable | Self::Unsupported => LogLevel::Warn,
            Self::Unknown | Self::Internal | Self::HandlerPanicked => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Trait impls
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
