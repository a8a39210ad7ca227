//! Trait definitions for hardware abstraction.
//!
//! The controller is written against [`DigitalPins`] so it can run against a
//! Raspberry Pi header, any `embedded-hal` board, a logging no-op backend, or
//! the test double in [`crate::hal::mock`].
//!
//! # Submodules
//!
//! - `pins`: digital pin trait, levels, pin modes and backend errors

pub mod pins;

pub use pins::*;
