//! Mock pin backend for testing without hardware.
//!
//! [`MockPins`] is a cloneable handle onto shared in-memory pin state. One
//! clone is handed to the controller (which moves it into its polling task),
//! the other stays with the test to drive the door sensor and inspect writes.
//!
//! # Example
//!
//! ```rust
//! use chamber_lighting::hal::MockPins;
//! use chamber_lighting::traits::{DigitalPins, Level, PinMode};
//!
//! let probe = MockPins::new();
//! let mut backend = probe.clone();
//!
//! backend.configure(27, PinMode::Output).unwrap();
//! backend.write(27, Level::High).unwrap();
//! backend.write(27, Level::High).unwrap();
//!
//! // The test-side clone sees everything the backend did
//! assert_eq!(probe.level(27), Some(Level::High));
//! assert_eq!(probe.write_count(27), 2);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::traits::{DigitalPins, Level, PinError, PinMode};

/// One recorded backend call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinCall {
    /// `configure(pin, mode)`
    Configure(u8, PinMode),
    /// `write(pin, level)`
    Write(u8, Level),
    /// `read(pin)` and the level returned
    Read(u8, Level),
}

#[derive(Debug, Default)]
struct MockState {
    modes: HashMap<u8, PinMode>,
    outputs: HashMap<u8, Level>,
    inputs: HashMap<u8, Level>,
    calls: Vec<PinCall>,
    fail_writes: bool,
}

/// Scriptable pin backend.
///
/// Inputs read as `Low` until set with [`set_input`](Self::set_input).
/// Every call is recorded in order and can be inspected with
/// [`calls`](Self::calls) or the counting helpers.
///
/// Pins above `max_pin` are rejected with [`PinError::InvalidPin`],
/// mimicking a real header.
#[derive(Clone, Debug)]
pub struct MockPins {
    state: Arc<Mutex<MockState>>,
    max_pin: u8,
}

impl MockPins {
    /// Creates a mock with every pin number accepted.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            max_pin: u8::MAX,
        }
    }

    /// Limits the accepted pin numbers to `0..=max_pin`.
    pub fn with_max_pin(mut self, max_pin: u8) -> Self {
        self.max_pin = max_pin;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, pin: u8) -> Result<(), PinError> {
        if pin > self.max_pin {
            Err(PinError::InvalidPin(pin))
        } else {
            Ok(())
        }
    }

    /// Sets the level that subsequent reads of `pin` return.
    pub fn set_input(&self, pin: u8, level: Level) {
        self.lock().inputs.insert(pin, level);
    }

    /// Makes every subsequent `write` fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Last level written to `pin`, if any.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.lock().outputs.get(&pin).copied()
    }

    /// Mode `pin` was last configured with, if any.
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.lock().modes.get(&pin).copied()
    }

    /// Number of writes issued to `pin`.
    pub fn write_count(&self, pin: u8) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, PinCall::Write(p, _) if *p == pin))
            .count()
    }

    /// Levels written to `pin`, oldest first.
    pub fn writes(&self, pin: u8) -> Vec<Level> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PinCall::Write(p, level) if *p == pin => Some(*level),
                _ => None,
            })
            .collect()
    }

    /// Number of reads issued to `pin`.
    pub fn read_count(&self, pin: u8) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, PinCall::Read(p, _) if *p == pin))
            .count()
    }

    /// Snapshot of every recorded call, oldest first.
    pub fn calls(&self) -> Vec<PinCall> {
        self.lock().calls.clone()
    }

    /// Forgets recorded calls, keeping pin levels and modes.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl Default for MockPins {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalPins for MockPins {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PinError> {
        self.check(pin)?;
        let mut state = self.lock();
        state.modes.insert(pin, mode);
        state.calls.push(PinCall::Configure(pin, mode));
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
        self.check(pin)?;
        let mut state = self.lock();
        if state.fail_writes {
            return Err(PinError::Backend("injected write failure".into()));
        }
        if state.modes.get(&pin) != Some(&PinMode::Output) {
            return Err(PinError::NotConfigured(pin));
        }
        state.outputs.insert(pin, level);
        state.calls.push(PinCall::Write(pin, level));
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, PinError> {
        self.check(pin)?;
        let mut state = self.lock();
        if !matches!(state.modes.get(&pin), Some(PinMode::Input(_))) {
            return Err(PinError::NotConfigured(pin));
        }
        let level = state.inputs.get(&pin).copied().unwrap_or(Level::Low);
        state.calls.push(PinCall::Read(pin, level));
        Ok(level)
    }
}

// ============================================================================
// Tests
// ============================================================================
