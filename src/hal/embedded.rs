//! Backend over a pair of `embedded-hal` 1.0 digital pins.
//!
//! Board HALs (ESP-IDF, rp2040, STM32, ...) hand out typed pins whose
//! direction and pull resistor are fixed when the driver is created. This
//! adapter binds one output and one input to the pin numbers the controller
//! is configured with; `configure` only checks that the number matches.
//!
//! The peripherals cannot be acquired twice, so a host rebuilding the
//! controller passes the backend returned by
//! [`LightController::release_backend`](crate::LightController::release_backend)
//! to the successor. [`Supervisor`](crate::Supervisor) does this itself.
//!
//! # Example
//!
//! ```ignore
//! use chamber_lighting::hal::EmbeddedHalPins;
//! use esp_idf_hal::gpio::{PinDriver, Pull};
//!
//! let relay = PinDriver::output(peripherals.pins.gpio2)?;
//! let mut door = PinDriver::input(peripherals.pins.gpio3)?;
//! door.set_pull(Pull::Down)?;
//!
//! let pins = EmbeddedHalPins::new(2, relay, 3, door);
//! ```

use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::traits::{DigitalPins, Level, PinError, PinMode};

/// One output and one input pin addressed by number.
pub struct EmbeddedHalPins<O, I> {
    output_pin: u8,
    output: O,
    input_pin: u8,
    input: I,
}

impl<O, I> EmbeddedHalPins<O, I>
where
    O: OutputPin + Send,
    I: InputPin + Send,
{
    /// Binds `output` to `output_pin` and `input` to `input_pin`.
    pub fn new(output_pin: u8, output: O, input_pin: u8, input: I) -> Self {
        Self {
            output_pin,
            output,
            input_pin,
            input,
        }
    }
}

fn backend_err<E: embedded_hal::digital::Error>(err: E) -> PinError {
    PinError::Backend(format!("{:?}", err.kind()))
}

impl<O, I> DigitalPins for EmbeddedHalPins<O, I>
where
    O: OutputPin + Send,
    I: InputPin + Send,
{
    fn backend_name(&self) -> &'static str {
        "embedded-hal"
    }

    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PinError> {
        match mode {
            PinMode::Output if pin == self.output_pin => Ok(()),
            PinMode::Input(pull) if pin == self.input_pin => {
                debug!("pin {} pull {:?} is fixed by the board HAL", pin, pull);
                Ok(())
            }
            _ => Err(PinError::InvalidPin(pin)),
        }
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
        if pin != self.output_pin {
            return Err(PinError::NotConfigured(pin));
        }
        match level {
            Level::High => self.output.set_high().map_err(backend_err),
            Level::Low => self.output.set_low().map_err(backend_err),
        }
    }

    fn read(&mut self, pin: u8) -> Result<Level, PinError> {
        if pin != self.input_pin {
            return Err(PinError::NotConfigured(pin));
        }
        self.input.is_high().map(Level::from).map_err(backend_err)
    }
}
