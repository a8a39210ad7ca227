//! Logging no-op backend used when no GPIO hardware is present.
//!
//! Every call is logged at `info` so the host log shows what the controller
//! *would* have done. Reads always return [`Level::Low`].

use log::info;

use crate::traits::{DigitalPins, Level, PinError, PinMode};

/// Fallback backend that touches no hardware.
#[derive(Debug, Default)]
pub struct LoggingPins;

impl LoggingPins {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

impl DigitalPins for LoggingPins {
    fn backend_name(&self) -> &'static str {
        "logging"
    }

    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PinError> {
        info!("GPIO setup for BCM{} with mode {:?}", pin, mode);
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
        info!("GPIO output for BCM{} to {}", pin, level);
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, PinError> {
        info!("GPIO input for BCM{} returning low", pin);
        Ok(Level::Low)
    }
}
