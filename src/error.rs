//! Error type for controller construction and host-side routing.

use std::fmt;

use crate::traits::PinError;

/// Errors surfaced to the host.
///
/// [`HardwareUnavailable`](Self::HardwareUnavailable) is never returned from
/// construction: the controller falls back to the logging backend and
/// reports it through
/// [`Handoff::hardware_present`](crate::Handoff::hardware_present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightError {
    /// No GPIO backend could be acquired. Only ever logged.
    HardwareUnavailable,
    /// Pin number the backend does not have.
    InvalidPin(u8),
    /// The backend refused to configure a pin.
    Pin(PinError),
    /// `start` was called outside a Tokio runtime.
    NoRuntime,
    /// API command the host does not know.
    UnknownCommand(String),
}

impl fmt::Display for LightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareUnavailable => f.write_str("GPIO hardware unavailable"),
            Self::InvalidPin(pin) => write!(f, "invalid GPIO pin {}", pin),
            Self::Pin(e) => write!(f, "pin setup failed: {}", e),
            Self::NoRuntime => f.write_str("light controller needs a Tokio runtime"),
            Self::UnknownCommand(name) => write!(f, "unknown lighting command: {}", name),
        }
    }
}

impl std::error::Error for LightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pin(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PinError> for LightError {
    fn from(e: PinError) -> Self {
        match e {
            PinError::InvalidPin(pin) => LightError::InvalidPin(pin),
            other => LightError::Pin(other),
        }
    }
}
