//! Lighting modes and the host's "auto turn on" override.
//!
//! Mode numbering matches what the host persists in its settings
//! (`0 = MANUAL`, `1 = AUTO`, `2 = ON`, `3 = OFF`).

use core::fmt;

/// Operating mode of the enclosure light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum LightMode {
    /// Light mirrors the door sensor directly.
    Manual,
    /// Light turns on with the door and stays on for the hold time after it closes.
    Auto,
    /// Light is always on.
    #[default]
    On,
    /// Light is always off.
    Off,
}

impl LightMode {
    /// All modes in cycling order.
    pub const ALL: [LightMode; 4] = [
        LightMode::Manual,
        LightMode::Auto,
        LightMode::On,
        LightMode::Off,
    ];

    /// Returns the mode as a lowercase string.
    ///
    /// ```
    /// use chamber_lighting::LightMode;
    ///
    /// assert_eq!(LightMode::Manual.as_str(), "manual");
    /// assert_eq!(LightMode::Auto.as_str(), "auto");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LightMode::Manual => "manual",
            LightMode::Auto => "auto",
            LightMode::On => "on",
            LightMode::Off => "off",
        }
    }

    /// Persisted numeric value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        match self {
            LightMode::Manual => 0,
            LightMode::Auto => 1,
            LightMode::On => 2,
            LightMode::Off => 3,
        }
    }

    /// Parses the persisted numeric value.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LightMode::Manual),
            1 => Some(LightMode::Auto),
            2 => Some(LightMode::On),
            3 => Some(LightMode::Off),
            _ => None,
        }
    }

    /// Parse a mode from text input.
    ///
    /// Accepts the names (`"manual"`, `"auto"`, `"on"`, `"off"`) or the
    /// persisted digits. Input is trimmed and case-insensitive.
    ///
    /// ```
    /// use chamber_lighting::LightMode;
    ///
    /// assert_eq!(LightMode::from_text("AUTO"), Some(LightMode::Auto));
    /// assert_eq!(LightMode::from_text(" 3 "), Some(LightMode::Off));
    /// assert_eq!(LightMode::from_text("dim"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" | "0" => Some(LightMode::Manual),
            "auto" | "1" => Some(LightMode::Auto),
            "on" | "2" => Some(LightMode::On),
            "off" | "3" => Some(LightMode::Off),
            _ => None,
        }
    }

    /// Next mode in the cycle used by the navbar button.
    ///
    /// Manual → Auto → On → Off → Manual.
    ///
    /// ```
    /// use chamber_lighting::LightMode;
    ///
    /// assert_eq!(LightMode::On.next(), LightMode::Off);
    /// assert_eq!(LightMode::Off.next(), LightMode::Manual);
    /// ```
    pub const fn next(self) -> Self {
        match self {
            LightMode::Manual => LightMode::Auto,
            LightMode::Auto => LightMode::On,
            LightMode::On => LightMode::Off,
            LightMode::Off => LightMode::Manual,
        }
    }

    /// Whether the mode needs the door sensor at all.
    #[inline]
    pub const fn reads_door(self) -> bool {
        matches!(self, LightMode::Manual | LightMode::Auto)
    }
}

impl From<LightMode> for u8 {
    fn from(mode: LightMode) -> Self {
        mode.as_u8()
    }
}

impl TryFrom<u8> for LightMode {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        LightMode::from_u8(value).ok_or(InvalidMode(value))
    }
}

impl fmt::Display for LightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted mode number outside the known range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidMode(pub u8);

impl fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lighting mode {}", self.0)
    }
}

impl std::error::Error for InvalidMode {}

/// When the host forces the light on regardless of the configured mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum AutoTurnOnWhen {
    /// Never override.
    #[default]
    Off,
    /// Force on while a print job is running.
    Printing,
    /// Force on while the printer is connected.
    Connected,
}

impl AutoTurnOnWhen {
    /// Persisted numeric value.
    pub const fn as_u8(self) -> u8 {
        match self {
            AutoTurnOnWhen::Off => 0,
            AutoTurnOnWhen::Printing => 1,
            AutoTurnOnWhen::Connected => 2,
        }
    }
}

impl From<AutoTurnOnWhen> for u8 {
    fn from(when: AutoTurnOnWhen) -> Self {
        when.as_u8()
    }
}

impl TryFrom<u8> for AutoTurnOnWhen {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AutoTurnOnWhen::Off),
            1 => Ok(AutoTurnOnWhen::Printing),
            2 => Ok(AutoTurnOnWhen::Connected),
            other => Err(InvalidMode(other)),
        }
    }
}
