//! Controller configuration and the host's persisted lighting settings.
//!
//! [`LightConfig`] is what one [`LightController`](crate::LightController)
//! runs with; it never changes for the lifetime of an instance.
//! [`LightingSettings`] mirrors the key/value pairs the host stores, with the
//! same key names and defaults, and converts into a `LightConfig` once the
//! effective mode is known.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use chamber_lighting::{LightConfig, LightMode, Level};
//!
//! // Use defaults
//! let config = LightConfig::default();
//! assert_eq!(config.hold_duration, Duration::from_millis(5000));
//!
//! // Or customize
//! let config = LightConfig::default()
//!     .with_mode(LightMode::Auto)
//!     .with_pins(27, 17)
//!     .with_light_on_level(Level::High)
//!     .with_hold_ms(2000);
//! assert!(!config.shares_pin());
//! ```

use std::time::Duration;

use crate::mode::{AutoTurnOnWhen, LightMode};
use crate::traits::Level;

/// Default sensor poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default hold time after the door closes in AUTO mode, in milliseconds.
pub const DEFAULT_HOLD_MS: u32 = 5000;

// ============================================================================
// Controller Config
// ============================================================================

/// Configuration of a single controller instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightConfig {
    /// Operating mode.
    pub mode: LightMode,
    /// Output pin driving the relay.
    pub light_pin: u8,
    /// Input pin reading the door sensor.
    pub door_pin: u8,
    /// Level that energizes the relay into "light on".
    pub light_on_level: Level,
    /// Level the sensor reports while the door is open.
    pub door_open_level: Level,
    /// How long the light stays on after the door closes (AUTO only).
    pub hold_duration: Duration,
    /// Delay between sensor polls.
    pub poll_interval: Duration,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            mode: LightMode::On,
            light_pin: 0,
            door_pin: 1,
            light_on_level: Level::Low,
            door_open_level: Level::High,
            hold_duration: Duration::from_millis(DEFAULT_HOLD_MS as u64),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LightConfig {
    /// Set the mode
    pub fn with_mode(mut self, mode: LightMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the relay and door sensor pins
    pub fn with_pins(mut self, light_pin: u8, door_pin: u8) -> Self {
        self.light_pin = light_pin;
        self.door_pin = door_pin;
        self
    }

    /// Set the level that turns the light on
    pub fn with_light_on_level(mut self, level: Level) -> Self {
        self.light_on_level = level;
        self
    }

    /// Set the level the sensor reports for an open door
    pub fn with_door_open_level(mut self, level: Level) -> Self {
        self.door_open_level = level;
        self
    }

    /// Set the AUTO hold time
    pub fn with_hold_duration(mut self, hold: Duration) -> Self {
        self.hold_duration = hold;
        self
    }

    /// Set the AUTO hold time in milliseconds
    pub fn with_hold_ms(self, ms: u32) -> Self {
        self.with_hold_duration(Duration::from_millis(ms as u64))
    }

    /// Set the poll interval. Zero is raised to one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Electrical level for a logical light state.
    ///
    /// ```
    /// use chamber_lighting::{LightConfig, Level};
    ///
    /// let config = LightConfig::default().with_light_on_level(Level::Low);
    /// assert_eq!(config.light_level(true), Level::Low);
    /// assert_eq!(config.light_level(false), Level::High);
    /// ```
    #[inline]
    pub fn light_level(&self, on: bool) -> Level {
        if on {
            self.light_on_level
        } else {
            self.light_on_level.inverted()
        }
    }

    /// Whether a sensor reading means the door is open.
    #[inline]
    pub fn door_is_open(&self, level: Level) -> bool {
        level == self.door_open_level
    }

    /// Whether the relay and the door sensor are assigned the same pin.
    ///
    /// The host's defaults put both on pin 0, so this is allowed. The pin
    /// then ends up as an output and door reads fail until it is changed.
    /// Which pin numbers exist is left to the backend.
    #[inline]
    pub fn shares_pin(&self) -> bool {
        self.light_pin == self.door_pin
    }
}
