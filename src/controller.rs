//! The light controller: polling task, mode policy and hand-off.
//!
//! This module provides [`LightController`], a handle onto one running
//! instance of the device driver.
//!
//! # Overview
//!
//! The controller:
//! - Probes for GPIO hardware once (or inherits the answer from a predecessor)
//! - Configures the door sensor as an input and the relay as an output
//! - Forces the relay to a known level, then evaluates the mode policy
//! - Runs a background task that polls the door and drives the relay
//! - Stops promptly on [`release`](LightController::release), exporting a [`Handoff`]
//!
//! # Example
//!
//! ```rust
//! use chamber_lighting::{LightConfig, LightController, LightMode};
//! use chamber_lighting::hal::{Capability, MockPins};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pins = MockPins::new();
//! let config = LightConfig::default().with_mode(LightMode::On).with_pins(27, 17);
//!
//! let probe = pins.clone();
//! let controller =
//!     LightController::start_with(config.clone(), None, move || Capability::available(probe))
//!         .unwrap();
//! assert!(controller.get_state());
//!
//! // Reconfigure: release first, then start the successor with the hand-off
//! let handoff = controller.release().await;
//! let controller = LightController::start_with(
//!     config.with_mode(LightMode::Off),
//!     Some(handoff),
//!     move || Capability::available(pins),
//! )
//! .unwrap();
//! assert!(!controller.get_state());
//! controller.release().await;
//! # }
//! ```
//!
//! # Timing
//!
//! All waits are multiples of the poll interval and are cut short as soon as
//! `release` is called, so `release` returns within one poll interval even
//! while a long AUTO hold is in progress.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::LightConfig;
use crate::error::LightError;
use crate::hal::{detect_hardware, BoxedPins, Capability, LoggingPins};
use crate::mode::LightMode;
use crate::traits::{PinError, PinMode, Pull};

// ============================================================================
// Hand-off
// ============================================================================

/// State exported by a released controller for its successor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Handoff {
    /// Last logical light state written to the relay.
    pub light_is_on: bool,
    /// Whether a real GPIO backend was in use.
    ///
    /// `false` makes the successor skip probing and use the logging backend.
    pub hardware_present: bool,
}

// ============================================================================
// Mode Policy
// ============================================================================

/// Outcome of one policy evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Drive the light to this logical state.
    Set(bool),
    /// AUTO: door just found closed with the light on; hold, then re-check.
    HoldThenRelease,
    /// Leave the light as it is.
    Keep,
}

/// Pure mode policy.
///
/// `door_open` is ignored by `On` and `Off`.
///
/// ```
/// use chamber_lighting::{decide, Decision, LightMode};
///
/// assert_eq!(decide(LightMode::On, false, false), Decision::Set(true));
/// assert_eq!(decide(LightMode::Manual, true, false), Decision::Set(true));
/// assert_eq!(decide(LightMode::Auto, false, true), Decision::HoldThenRelease);
/// assert_eq!(decide(LightMode::Auto, false, false), Decision::Keep);
/// ```
pub fn decide(mode: LightMode, door_open: bool, light_is_on: bool) -> Decision {
    match mode {
        LightMode::On => Decision::Set(true),
        LightMode::Off => Decision::Set(false),
        LightMode::Manual => Decision::Set(door_open),
        LightMode::Auto if door_open => Decision::Set(true),
        LightMode::Auto if light_is_on => Decision::HoldThenRelease,
        LightMode::Auto => Decision::Keep,
    }
}

// ============================================================================
// Shared State
// ============================================================================

#[derive(Debug)]
struct RuntimeState {
    light_is_on: bool,
    stopping: bool,
}

/// State shared between the handle and the polling task.
#[derive(Debug)]
struct Shared {
    state: Mutex<RuntimeState>,
    /// Wakes any sleep in the polling task when `stopping` is set.
    wake: Notify,
    hardware_present: bool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn light_is_on(&self) -> bool {
        self.lock().light_is_on
    }

    fn is_stopping(&self) -> bool {
        self.lock().stopping
    }

    fn request_stop(&self) {
        self.lock().stopping = true;
        self.wake.notify_one();
    }

    /// Sleeps for `duration` or until a stop is requested.
    ///
    /// Returns `true` if the task should stop.
    async fn pause(&self, duration: Duration) -> bool {
        if self.is_stopping() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.wake.notified() => {}
        }
        self.is_stopping()
    }
}

// ============================================================================
// Driver (owned by the polling task)
// ============================================================================

struct Driver {
    config: LightConfig,
    pins: BoxedPins,
    shared: Arc<Shared>,
}

impl Driver {
    /// Writes the relay unconditionally and records the new state.
    fn drive(&mut self, on: bool) -> Result<(), PinError> {
        let level = self.config.light_level(on);
        info!("Setting GPIO{} to {}", self.config.light_pin, level);
        self.pins.write(self.config.light_pin, level)?;
        self.shared.lock().light_is_on = on;
        Ok(())
    }

    /// Write-if-changed. Failures are logged and leave the state untouched.
    fn change_light_state_to(&mut self, on: bool) {
        if self.shared.light_is_on() == on {
            return;
        }
        match self.drive(on) {
            Ok(()) => info!("Light turned {}", if on { "on" } else { "off" }),
            Err(e) => error!("failed to switch light: {}", e),
        }
    }

    fn door_is_open(&mut self) -> Option<bool> {
        match self.pins.read(self.config.door_pin) {
            Ok(level) => {
                let open = self.config.door_is_open(level);
                debug!("door is {}", if open { "open" } else { "closed" });
                Some(open)
            }
            Err(e) => {
                error!("failed to read door sensor: {}", e);
                None
            }
        }
    }

    /// Evaluates the policy and applies immediate decisions.
    ///
    /// A hold is returned to the caller rather than performed, so this never
    /// sleeps.
    fn step(&mut self) -> Decision {
        let mode = self.config.mode;
        let door_open = if mode.reads_door() {
            match self.door_is_open() {
                Some(open) => open,
                None => return Decision::Keep,
            }
        } else {
            false
        };

        let decision = decide(mode, door_open, self.shared.light_is_on());
        if let Decision::Set(on) = decision {
            self.change_light_state_to(on);
        }
        decision
    }

    async fn evaluate(&mut self) {
        if self.step() == Decision::HoldThenRelease {
            self.hold_and_release().await;
        }
    }

    async fn hold_and_release(&mut self) {
        let hold = self.config.hold_duration;
        let poll = self.config.poll_interval;
        debug!("door closed, holding light for {:?}", hold);

        let mut held = Duration::ZERO;
        while held < hold {
            let increment = poll.min(hold - held);
            if self.shared.pause(increment).await {
                info!("Hold interrupted by shutdown, turning light off");
                self.change_light_state_to(false);
                return;
            }
            held += increment;
        }

        match self.door_is_open() {
            Some(false) => self.change_light_state_to(false),
            Some(true) => debug!("door reopened during hold, light stays on"),
            None => {}
        }
    }

    /// Polls until stopped, then gives the backend back.
    async fn run(mut self) -> BoxedPins {
        loop {
            if self.shared.is_stopping() {
                break;
            }
            self.evaluate().await;
            if self.shared.pause(self.config.poll_interval).await {
                break;
            }
        }
        debug!("polling loop for GPIO{} stopped", self.config.light_pin);
        self.pins
    }
}

// ============================================================================
// Controller Handle
// ============================================================================

/// Handle onto one running light controller.
///
/// Created by [`start`](Self::start); stopped by
/// [`release`](Self::release), which consumes the handle. Dropping a handle
/// without releasing it still asks the task to stop, but does not wait.
///
/// # Thread Safety
///
/// [`get_state`](Self::get_state) only takes a short lock and may be called
/// from any thread. Only one controller may drive a given pin pair at a
/// time: always `release` the old instance before starting its successor.
pub struct LightController {
    shared: Arc<Shared>,
    task: Option<JoinHandle<BoxedPins>>,
    mode: LightMode,
    backend: &'static str,
}

impl LightController {
    /// Starts a controller, probing for GPIO hardware if needed.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`LightError::InvalidPin`] if the backend has no such pin,
    /// [`LightError::Pin`] if it refuses setup for another reason,
    /// [`LightError::NoRuntime`] outside a runtime. Missing hardware is not
    /// an error.
    pub fn start(config: LightConfig, handoff: Option<Handoff>) -> Result<Self, LightError> {
        Self::start_with(config, handoff, detect_hardware)
    }

    /// Starts a controller with a custom hardware probe.
    ///
    /// `probe` is not called when `handoff` says no hardware was present.
    /// To reuse the backend of a released controller, return it from `probe`
    /// (see [`release_backend`](Self::release_backend)).
    pub fn start_with<F>(
        config: LightConfig,
        handoff: Option<Handoff>,
        probe: F,
    ) -> Result<Self, LightError>
    where
        F: FnOnce() -> Capability,
    {
        let runtime = Handle::try_current().map_err(|_| LightError::NoRuntime)?;

        let skip_probe = matches!(handoff, Some(h) if !h.hardware_present);
        let capability = if skip_probe {
            Capability::Unavailable
        } else {
            probe()
        };
        let (mut pins, hardware_present): (BoxedPins, bool) = match capability {
            Capability::Available(pins) => (pins, true),
            Capability::Unavailable => {
                if !skip_probe {
                    warn!(
                        "{}, falling back to logging backend",
                        LightError::HardwareUnavailable
                    );
                }
                (Box::new(LoggingPins::new()), false)
            }
        };
        let backend = pins.backend_name();
        if config.shares_pin() {
            warn!(
                "relay and door sensor share GPIO{}, door reads will fail",
                config.light_pin
            );
        }
        info!(
            "Initializing light controller: mode {}, relay GPIO{}, door GPIO{}, {} backend",
            config.mode, config.light_pin, config.door_pin, backend
        );

        pins.configure(
            config.door_pin,
            PinMode::Input(Pull::opposing(config.door_open_level)),
        )?;
        pins.configure(config.light_pin, PinMode::Output)?;

        let initial = handoff.map_or(false, |h| h.light_is_on);
        let shared = Arc::new(Shared {
            state: Mutex::new(RuntimeState {
                light_is_on: initial,
                stopping: false,
            }),
            wake: Notify::new(),
            hardware_present,
        });

        let mode = config.mode;
        let mut driver = Driver {
            config,
            pins,
            shared: Arc::clone(&shared),
        };

        // Forced write: the relay may be in any state after a restart.
        driver.drive(initial)?;
        // A hold is left to the task so construction never sleeps.
        driver.step();

        let task = runtime.spawn(driver.run());

        Ok(Self {
            shared,
            task: Some(task),
            mode,
            backend,
        })
    }

    /// Whether the light is currently on.
    pub fn get_state(&self) -> bool {
        self.shared.light_is_on()
    }

    /// Whether a real GPIO backend is in use.
    pub fn hardware_present(&self) -> bool {
        self.shared.hardware_present
    }

    /// Mode this instance runs in.
    pub fn mode(&self) -> LightMode {
        self.mode
    }

    /// Name of the pin backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend
    }

    /// Current hand-off record.
    pub fn handoff(&self) -> Handoff {
        Handoff {
            light_is_on: self.get_state(),
            hardware_present: self.hardware_present(),
        }
    }

    /// Stops the polling task and waits for it to finish.
    ///
    /// Returns the final state for the successor. Completes within one poll
    /// interval, including when an AUTO hold is in progress (the light is
    /// then switched off).
    pub async fn release(self) -> Handoff {
        let (handoff, _) = self.release_backend().await;
        handoff
    }

    /// Like [`release`](Self::release), but also returns the pin backend.
    ///
    /// Backends built from owned peripherals cannot be detected a second
    /// time; pass this one to the successor to keep the hardware. `None`
    /// only if the polling task panicked.
    pub async fn release_backend(mut self) -> (Handoff, Option<BoxedPins>) {
        self.shared.request_stop();
        let pins = match self.task.take() {
            Some(task) => match task.await {
                Ok(pins) => Some(pins),
                Err(e) => {
                    error!("light controller task ended abnormally: {}", e);
                    None
                }
            },
            None => None,
        };
        let handoff = self.handoff();
        info!(
            "Light controller released (light {}, hardware {})",
            if handoff.light_is_on { "on" } else { "off" },
            handoff.hardware_present
        );
        (handoff, pins)
    }
}

impl Drop for LightController {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.shared.request_stop();
        }
    }
}

impl core::fmt::Debug for LightController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LightController")
            .field("mode", &self.mode)
            .field("backend", &self.backend)
            .field("light_is_on", &self.get_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockPins;
    use crate::traits::Level;
    use proptest::prelude::*;

    const LIGHT: u8 = 27;
    const DOOR: u8 = 17;

    fn config(mode: LightMode) -> LightConfig {
        LightConfig::default()
            .with_mode(mode)
            .with_pins(LIGHT, DOOR)
            .with_light_on_level(Level::High)
            .with_door_open_level(Level::High)
    }

    fn start(config: LightConfig, pins: &MockPins) -> LightController {
        let backend = pins.clone();
        LightController::start_with(config, None, move || Capability::available(backend)).unwrap()
    }

    // =========================================================================
    // decide()
    // =========================================================================

    #[test]
    fn decide_on_off_ignore_door() {
        for door in [false, true] {
            for light in [false, true] {
                assert_eq!(decide(LightMode::On, door, light), Decision::Set(true));
                assert_eq!(decide(LightMode::Off, door, light), Decision::Set(false));
            }
        }
    }

    #[test]
    fn decide_auto() {
        assert_eq!(decide(LightMode::Auto, true, false), Decision::Set(true));
        assert_eq!(decide(LightMode::Auto, true, true), Decision::Set(true));
        assert_eq!(decide(LightMode::Auto, false, true), Decision::HoldThenRelease);
        assert_eq!(decide(LightMode::Auto, false, false), Decision::Keep);
    }

    proptest! {
        #[test]
        fn decide_manual_mirrors_door(door: bool, light: bool) {
            prop_assert_eq!(decide(LightMode::Manual, door, light), Decision::Set(door));
        }

        #[test]
        fn decide_never_turns_light_off_with_door_open(light: bool) {
            for mode in [LightMode::Manual, LightMode::Auto, LightMode::On] {
                prop_assert_eq!(decide(mode, true, light), Decision::Set(true));
            }
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn construction_configures_pins() {
        let pins = MockPins::new();
        let controller = start(config(LightMode::Off), &pins);

        assert_eq!(pins.mode(DOOR), Some(PinMode::Input(Pull::Down)));
        assert_eq!(pins.mode(LIGHT), Some(PinMode::Output));
        assert_eq!(controller.backend_name(), "mock");
        assert!(controller.hardware_present());
        controller.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn door_open_low_gets_pull_up() {
        let pins = MockPins::new();
        let controller = start(config(LightMode::Off).with_door_open_level(Level::Low), &pins);
        assert_eq!(pins.mode(DOOR), Some(PinMode::Input(Pull::Up)));
        controller.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn forced_initial_write_even_when_unchanged() {
        let pins = MockPins::new();
        let controller = start(config(LightMode::Off), &pins);

        // Off mode with default state off: the forced write is the only one
        assert_eq!(pins.writes(LIGHT), vec![Level::Low]);
        assert!(!controller.get_state());
        controller.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_evaluation_runs_during_construction() {
        let pins = MockPins::new();
        let controller = start(config(LightMode::On), &pins);

        assert!(controller.get_state());
        assert_eq!(pins.writes(LIGHT), vec![Level::Low, Level::High]);
        controller.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_hardware_falls_back() {
        let controller =
            LightController::start_with(config(LightMode::On), None, || Capability::Unavailable)
                .unwrap();

        assert!(!controller.hardware_present());
        assert_eq!(controller.backend_name(), "logging");
        assert!(controller.get_state());

        let handoff = controller.release().await;
        assert_eq!(
            handoff,
            Handoff {
                light_is_on: true,
                hardware_present: false
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pin_range_is_left_to_backend() {
        let pins = MockPins::new();
        let controller = start(config(LightMode::On).with_pins(33, 34), &pins);

        assert_eq!(pins.mode(34), Some(PinMode::Input(Pull::Down)));
        assert_eq!(pins.level(33), Some(Level::High));
        controller.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shared_pin_still_starts() {
        let pins = MockPins::new();
        let controller = start(config(LightMode::On).with_pins(0, 0), &pins);

        assert!(controller.get_state());
        assert_eq!(pins.mode(0), Some(PinMode::Output));
        controller.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn backend_rejecting_pin_is_invalid_pin() {
        let pins = MockPins::new().with_max_pin(20);
        let backend = pins.clone();
        let result = LightController::start_with(config(LightMode::On), None, move || {
            Capability::available(backend)
        });
        assert_eq!(result.err(), Some(LightError::InvalidPin(DOOR.max(LIGHT))));
    }

    #[tokio::test(start_paused = true)]
    async fn forced_write_failure_is_fatal() {
        let pins = MockPins::new();
        pins.fail_writes(true);
        let backend = pins.clone();
        let result = LightController::start_with(config(LightMode::On), None, move || {
            Capability::available(backend)
        });
        assert!(matches!(result, Err(LightError::Pin(PinError::Backend(_)))));
    }

    #[test]
    fn start_outside_runtime_fails() {
        let result =
            LightController::start_with(config(LightMode::On), None, || Capability::Unavailable);
        assert_eq!(result.err(), Some(LightError::NoRuntime));
    }

    // =========================================================================
    // Runtime behavior
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn runtime_write_failure_keeps_state() {
        let pins = MockPins::new();
        let controller = start(config(LightMode::Manual), &pins);
        assert!(!controller.get_state());

        pins.fail_writes(true);
        pins.set_input(DOOR, Level::High);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!controller.get_state());

        pins.fail_writes(false);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(controller.get_state());
        controller.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn released_backend_drives_successor() {
        let pins = MockPins::new();
        let first = start(config(LightMode::On), &pins);
        let (handoff, backend) = first.release_backend().await;
        let backend = backend.unwrap();
        assert_eq!(backend.backend_name(), "mock");

        let second = LightController::start_with(
            config(LightMode::Off),
            Some(handoff),
            move || Capability::Available(backend),
        )
        .unwrap();
        assert!(second.hardware_present());
        assert!(!second.get_state());
        assert_eq!(pins.level(LIGHT), Some(Level::Low));
        second.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn drop_without_release_stops_task() {
        let pins = MockPins::new();
        let controller = start(config(LightMode::Manual), &pins);
        drop(controller);

        tokio::time::sleep(Duration::from_millis(10)).await;
        pins.clear_calls();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(pins.read_count(DOOR), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_hold_turns_off_on_next_poll() {
        let pins = MockPins::new();
        pins.set_input(DOOR, Level::High);
        let controller = start(config(LightMode::Auto).with_hold_ms(0), &pins);
        assert!(controller.get_state());

        pins.set_input(DOOR, Level::Low);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!controller.get_state());
        controller.release().await;
    }
}
