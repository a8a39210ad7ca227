//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of
//! [`DigitalPins`](crate::traits::DigitalPins) and the one-shot hardware
//! probe used when a controller starts.
//!
//! # Available Implementations
//!
//! - `mock`: scriptable test double
//! - `noop`: logging fallback used when no GPIO hardware is present
//! - `rpi`: Raspberry Pi header via `rppal` (requires `rpi` feature)
//! - `embedded`: any `embedded-hal` 1.0 pin pair (requires `embedded-hal` feature)

use log::warn;

use crate::traits::DigitalPins;

pub mod mock;
pub mod noop;

#[cfg(feature = "rpi")]
pub mod rpi;

#[cfg(feature = "embedded-hal")]
pub mod embedded;

pub use mock::*;
pub use noop::*;

#[cfg(feature = "rpi")]
pub use rpi::*;

#[cfg(feature = "embedded-hal")]
pub use embedded::*;

/// Boxed backend as stored by the controller.
pub type BoxedPins = Box<dyn DigitalPins>;

/// Outcome of probing for GPIO hardware.
pub enum Capability {
    /// A real backend was acquired.
    Available(BoxedPins),
    /// No hardware; the caller should fall back to [`LoggingPins`].
    Unavailable,
}

impl Capability {
    /// Wraps any backend as available.
    pub fn available(pins: impl DigitalPins + 'static) -> Self {
        Capability::Available(Box::new(pins))
    }

    /// Returns `true` if a real backend was acquired.
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }
}

impl core::fmt::Debug for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Capability::Available(pins) => write!(f, "Available({})", pins.backend_name()),
            Capability::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Probes for the platform GPIO backend.
///
/// With the `rpi` feature this tries to open the Raspberry Pi GPIO block;
/// without it there is no hardware backend to probe and the result is always
/// [`Capability::Unavailable`].
pub fn detect_hardware() -> Capability {
    #[cfg(feature = "rpi")]
    {
        match RppalPins::new() {
            Ok(pins) => return Capability::available(pins),
            Err(e) => warn!("Raspberry Pi GPIO unavailable: {}", e),
        }
    }

    #[cfg(not(feature = "rpi"))]
    warn!("built without a GPIO backend");

    Capability::Unavailable
}
