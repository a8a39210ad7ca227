//! # chamber-lighting
//!
//! Door-sensor driven light controller for 3D printer enclosures.
//!
//! A relay on one GPIO pin switches the enclosure light; a door sensor on
//! another reports whether the enclosure is open. A background task polls
//! the sensor and drives the relay according to the selected mode.
//!
//! ## Features
//!
//! - **Four modes**: MANUAL mirrors the door, AUTO keeps the light on for a
//!   hold time after the door closes, ON and OFF ignore the door
//! - **Hardware abstraction**: one small pin trait with Raspberry Pi,
//!   `embedded-hal`, logging and mock backends
//! - **Flicker-free reconfiguration**: a released controller hands its light
//!   state and hardware probe result to its successor
//! - **Prompt shutdown**: release completes within one poll interval, even
//!   mid-hold
//! - **Host integration**: settings, printer events and the navbar API via
//!   [`Supervisor`]
//!
//! ## Architecture
//!
//! - `traits` - The pin abstraction
//! - `hal` - Pin backends and the hardware probe
//! - `mode` - Lighting modes
//! - `config` - Controller configuration and host settings
//! - `controller` - Polling task, mode policy and hand-off
//! - `supervisor` - Lifecycle and event handling for the host
//! - `api` - Host API commands and replies
//!
//! ## Example
//!
//! ```rust
//! use chamber_lighting::{LightConfig, LightController, LightMode};
//! use chamber_lighting::hal::{Capability, MockPins};
//! use chamber_lighting::traits::Level;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pins = MockPins::new();
//! let config = LightConfig::default()
//!     .with_mode(LightMode::Manual)
//!     .with_pins(27, 17)
//!     .with_door_open_level(Level::High);
//!
//! // Door is open when the controller starts
//! pins.set_input(17, Level::High);
//! let probe = pins.clone();
//! let controller =
//!     LightController::start_with(config, None, move || Capability::available(probe)).unwrap();
//! assert!(controller.get_state());
//!
//! let handoff = controller.release().await;
//! assert!(handoff.light_is_on);
//! # }
//! ```

#![warn(missing_docs)]

/// Host API commands and JSON replies.
pub mod api;
/// Controller configuration and persisted host settings.
pub mod config;
/// The light controller and its polling task.
pub mod controller;
/// Error type for construction and API routing.
pub mod error;
/// Pin backends and hardware detection.
pub mod hal;
/// Lighting modes.
pub mod mode;
/// Host lifecycle, settings and event handling.
pub mod supervisor;
/// The digital pin abstraction.
pub mod traits;

pub use api::{ApiCommand, ApiReply};
pub use config::{LightConfig, LightingSettings};
pub use controller::{decide, Decision, Handoff, LightController};
pub use error::LightError;
pub use mode::{AutoTurnOnWhen, LightMode};
pub use supervisor::{HostEvent, PrinterStatus, Supervisor};
pub use traits::{DigitalPins, Level, PinError, PinMode, Pull};
