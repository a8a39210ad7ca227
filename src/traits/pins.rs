//! Digital pin abstraction for the relay output and door sensor input.
//!
//! The controller only ever needs three operations on numbered pins:
//! configure a direction (and pull resistor for inputs), write a level, and
//! read a level. Backends live in [`crate::hal`].
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`DigitalPins`] | Backend trait over numbered GPIO pins |
//! | [`Level`] | Electrical level (`High` / `Low`) |
//! | [`PinMode`] | Direction plus pull resistor selection |
//! | [`PinError`] | Backend failure |
//!
//! # Example
//!
//! ```rust
//! use chamber_lighting::hal::MockPins;
//! use chamber_lighting::traits::{DigitalPins, Level, PinMode, Pull};
//!
//! let mut pins = MockPins::new();
//! pins.configure(17, PinMode::Input(Pull::Down)).unwrap();
//! pins.configure(27, PinMode::Output).unwrap();
//!
//! pins.set_input(17, Level::High);
//! assert_eq!(pins.read(17).unwrap(), Level::High);
//!
//! pins.write(27, Level::Low).unwrap();
//! assert_eq!(pins.level(27), Some(Level::Low));
//! ```

use core::fmt;

/// Electrical level of a digital pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// Logic 0.
    #[default]
    Low,
    /// Logic 1.
    High,
}

impl Level {
    /// Returns the opposite level.
    ///
    /// ```
    /// use chamber_lighting::Level;
    ///
    /// assert_eq!(Level::High.inverted(), Level::Low);
    /// assert_eq!(Level::Low.inverted(), Level::High);
    /// ```
    #[inline]
    pub const fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// Returns `true` for [`Level::High`].
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Returns the level as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::High => "high",
        }
    }
}

impl From<bool> for Level {
    /// `true` maps to `High`, matching how the host stores levels.
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal pull resistor for an input pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pull {
    /// Pull towards `High` when undriven.
    Up,
    /// Pull towards `Low` when undriven.
    Down,
    /// Floating input.
    None,
}

impl Pull {
    /// Pull resistor that keeps an undriven sensor line away from `active`.
    ///
    /// A sensor that reports `High` when triggered gets a pull-down, and the
    /// other way round.
    ///
    /// ```
    /// use chamber_lighting::traits::{Level, Pull};
    ///
    /// assert_eq!(Pull::opposing(Level::High), Pull::Down);
    /// assert_eq!(Pull::opposing(Level::Low), Pull::Up);
    /// ```
    pub const fn opposing(active: Level) -> Self {
        match active {
            Level::High => Pull::Down,
            Level::Low => Pull::Up,
        }
    }
}

/// Pin direction requested from a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    /// Input with the given pull resistor.
    Input(Pull),
    /// Push-pull output. The level is left untouched until the first write.
    Output,
}

/// Errors reported by a [`DigitalPins`] backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinError {
    /// The pin number does not exist on this platform.
    InvalidPin(u8),
    /// The pin was used before being configured, or in the wrong direction.
    NotConfigured(u8),
    /// Backend-specific failure (permissions, I/O, pin already claimed).
    Backend(String),
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "pin {} is not available on this platform", pin),
            Self::NotConfigured(pin) => write!(f, "pin {} is not configured for this operation", pin),
            Self::Backend(msg) => write!(f, "GPIO backend error: {}", msg),
        }
    }
}

impl std::error::Error for PinError {}

/// Backend over numbered digital pins.
///
/// Implementations are moved into the controller's polling task, hence the
/// `Send` bound. All operations are synchronous.
///
/// # Implementation Notes
///
/// - `configure` may be called more than once for the same pin; the last call wins
/// - `write` on an input pin, or `read` on an unconfigured pin, should return
///   [`PinError::NotConfigured`]
/// - Reading an output pin is not required by the controller
///
/// # Example Implementation
///
/// ```rust,ignore
/// use chamber_lighting::traits::{DigitalPins, Level, PinError, PinMode};
///
/// struct MyBoard { /* register handles */ }
///
/// impl DigitalPins for MyBoard {
///     fn backend_name(&self) -> &'static str { "my-board" }
///
///     fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PinError> {
///         // Program direction and pull registers...
///         Ok(())
///     }
///
///     fn write(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
///         // Set or clear the output bit...
///         Ok(())
///     }
///
///     fn read(&mut self, pin: u8) -> Result<Level, PinError> {
///         Ok(Level::Low)
///     }
/// }
/// ```
pub trait DigitalPins: Send {
    /// Short backend name for log lines.
    fn backend_name(&self) -> &'static str;

    /// Configure a pin's direction and, for inputs, its pull resistor.
    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PinError>;

    /// Drive an output pin to `level`.
    fn write(&mut self, pin: u8, level: Level) -> Result<(), PinError>;

    /// Sample an input pin.
    fn read(&mut self, pin: u8) -> Result<Level, PinError>;
}

impl<P: DigitalPins + ?Sized> DigitalPins for Box<P> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PinError> {
        (**self).configure(pin, mode)
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
        (**self).write(pin, level)
    }

    fn read(&mut self, pin: u8) -> Result<Level, PinError> {
        (**self).read(pin)
    }
}
