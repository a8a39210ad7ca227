//! Raspberry Pi GPIO backend using `rppal`.
//!
//! Pins are addressed by BCM number. Acquiring [`RppalPins`] fails on
//! anything that is not a Raspberry Pi (or when `/dev/gpiomem` is not
//! accessible), which is how [`detect_hardware`](super::detect_hardware)
//! decides between this backend and the logging fallback.
//!
//! # Reset on drop
//!
//! `rppal` normally restores a pin's previous mode when its handle is dropped.
//! That would let the relay input float for the short window between one
//! controller releasing the pins and its successor claiming them, so every
//! handle is created with reset-on-drop disabled.

use std::collections::HashMap;

use log::debug;
use rppal::gpio::{self, Gpio, InputPin, OutputPin};

use crate::traits::{DigitalPins, Level, PinError, PinMode, Pull};

enum Claimed {
    Input(InputPin),
    Output(OutputPin),
}

/// Raspberry Pi header accessed through `rppal`.
pub struct RppalPins {
    gpio: Gpio,
    pins: HashMap<u8, Claimed>,
}

impl RppalPins {
    /// Opens the GPIO peripheral.
    ///
    /// # Errors
    ///
    /// Returns an error if this is not a Raspberry Pi or the GPIO memory
    /// cannot be mapped.
    pub fn new() -> Result<Self, PinError> {
        let gpio = Gpio::new().map_err(map_err)?;
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }
}

fn map_err(err: gpio::Error) -> PinError {
    match err {
        gpio::Error::PinNotAvailable(pin) => PinError::InvalidPin(pin),
        other => PinError::Backend(other.to_string()),
    }
}

fn to_rppal(level: Level) -> gpio::Level {
    match level {
        Level::High => gpio::Level::High,
        Level::Low => gpio::Level::Low,
    }
}

fn from_rppal(level: gpio::Level) -> Level {
    match level {
        gpio::Level::High => Level::High,
        gpio::Level::Low => Level::Low,
    }
}

impl DigitalPins for RppalPins {
    fn backend_name(&self) -> &'static str {
        "rppal"
    }

    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PinError> {
        // Release our own claim first so rppal does not report the pin as in use.
        self.pins.remove(&pin);

        let raw = self.gpio.get(pin).map_err(map_err)?;
        let claimed = match mode {
            PinMode::Input(pull) => {
                let mut input = match pull {
                    Pull::Up => raw.into_input_pullup(),
                    Pull::Down => raw.into_input_pulldown(),
                    Pull::None => raw.into_input(),
                };
                input.set_reset_on_drop(false);
                Claimed::Input(input)
            }
            PinMode::Output => {
                let mut output = raw.into_output();
                output.set_reset_on_drop(false);
                Claimed::Output(output)
            }
        };

        debug!("BCM{} configured as {:?}", pin, mode);
        self.pins.insert(pin, claimed);
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
        match self.pins.get_mut(&pin) {
            Some(Claimed::Output(output)) => {
                output.write(to_rppal(level));
                Ok(())
            }
            _ => Err(PinError::NotConfigured(pin)),
        }
    }

    fn read(&mut self, pin: u8) -> Result<Level, PinError> {
        match self.pins.get(&pin) {
            Some(Claimed::Input(input)) => Ok(from_rppal(input.read())),
            _ => Err(PinError::NotConfigured(pin)),
        }
    }
}
