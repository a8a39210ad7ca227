//! Host-facing owner of the light controller.
//!
//! The [`Supervisor`] holds the persisted [`LightingSettings`], the printer
//! status reported by host events, and at most one running
//! [`LightController`]. Every reconfiguration is release-then-construct: the
//! old instance is stopped, its [`Handoff`] captured, and the successor started
//! from it so the light does not flicker and hardware is not probed twice.
//!
//! # Example
//!
//! ```rust
//! use chamber_lighting::hal::{Capability, MockPins};
//! use chamber_lighting::{LightMode, LightingSettings, Supervisor};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pins = MockPins::new();
//! let settings = LightingSettings::default().with_pins(27, 17);
//! let mut supervisor =
//!     Supervisor::with_probe(settings, move || Capability::available(pins.clone()));
//!
//! supervisor.on_startup().await.unwrap();
//! assert!(supervisor.is_light_on());
//!
//! // Navbar button: ON -> OFF
//! assert_eq!(supervisor.next_mode().await.unwrap(), LightMode::Off);
//! assert!(!supervisor.is_light_on());
//!
//! supervisor.shutdown().await;
//! # }
//! ```

use core::fmt;

use log::{error, info, warn};

use crate::api::{ApiCommand, ApiReply};
use crate::config::LightingSettings;
use crate::controller::{Handoff, LightController};
use crate::error::LightError;
use crate::hal::{detect_hardware, BoxedPins, Capability};
use crate::mode::{AutoTurnOnWhen, LightMode};

// ============================================================================
// Host Events
// ============================================================================

/// Host lifecycle events the lighting plugin reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// Settings were changed outside the settings dialog.
    SettingsChanged,
    /// Printer connection established.
    Connected,
    /// Printer connection lost.
    Disconnected,
    /// A print job started or resumed.
    PrintStarted,
    /// A print job finished, failed or was cancelled.
    PrintStopped,
}

impl HostEvent {
    /// Maps a host event name onto the events handled here.
    ///
    /// Returns `None` for events the plugin ignores.
    ///
    /// ```
    /// use chamber_lighting::HostEvent;
    ///
    /// assert_eq!(HostEvent::from_name("PrintDone"), Some(HostEvent::PrintStopped));
    /// assert_eq!(HostEvent::from_name("ZChange"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SettingsUpdated" => Some(HostEvent::SettingsChanged),
            "Connected" => Some(HostEvent::Connected),
            "Disconnected" | "Error" => Some(HostEvent::Disconnected),
            "PrintStarted" | "PrintResumed" => Some(HostEvent::PrintStarted),
            "PrintDone" | "PrintFailed" | "PrintCancelled" => Some(HostEvent::PrintStopped),
            _ => None,
        }
    }
}

/// Printer status as tracked from host events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrinterStatus {
    /// A printer connection is open.
    pub connected: bool,
    /// A print job is running.
    pub printing: bool,
}

impl PrinterStatus {
    fn apply(&mut self, event: HostEvent) {
        match event {
            HostEvent::Connected => self.connected = true,
            HostEvent::Disconnected => {
                self.connected = false;
                self.printing = false;
            }
            HostEvent::PrintStarted => {
                self.connected = true;
                self.printing = true;
            }
            HostEvent::PrintStopped => self.printing = false,
            HostEvent::SettingsChanged => {}
        }
    }
}

// ============================================================================
// Supervisor
// ============================================================================

/// Owner of the lighting settings and the running controller.
///
/// `P` is the hardware probe. It runs for the first controller; successors
/// reuse the backend their predecessor released, so `P` is only called
/// again if that backend was lost.
pub struct Supervisor<P = fn() -> Capability> {
    settings: LightingSettings,
    printer: PrinterStatus,
    controller: Option<LightController>,
    last_handoff: Option<Handoff>,
    /// Hardware backend released by the last controller.
    spare: Option<BoxedPins>,
    probe: P,
}

impl Supervisor {
    /// Creates a supervisor that detections for the platform GPIO backend.
    pub fn new(settings: LightingSettings) -> Self {
        Self::with_probe(settings, detect_hardware)
    }
}

impl<P> Supervisor<P>
where
    P: Fn() -> Capability,
{
    /// Creates a supervisor with a custom hardware probe.
    pub fn with_probe(settings: LightingSettings, probe: P) -> Self {
        Self {
            settings,
            printer: PrinterStatus::default(),
            controller: None,
            last_handoff: None,
            spare: None,
            probe,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &LightingSettings {
        &self.settings
    }

    /// Printer status derived from events so far.
    pub fn printer(&self) -> PrinterStatus {
        self.printer
    }

    /// Running controller, if construction succeeded.
    pub fn controller(&self) -> Option<&LightController> {
        self.controller.as_ref()
    }

    /// Mode the controller should run in right now.
    ///
    /// The configured mode, unless `auto_turn_on_when` forces `On`.
    pub fn effective_mode(&self) -> LightMode {
        let forced = match self.settings.auto_turn_on_when {
            AutoTurnOnWhen::Off => false,
            AutoTurnOnWhen::Printing => self.printer.printing,
            AutoTurnOnWhen::Connected => self.printer.connected,
        };
        if forced {
            LightMode::On
        } else {
            self.settings.lighting_mode
        }
    }

    /// Whether the light is on.
    ///
    /// Without a running controller this is the last state any instance
    /// left the relay in.
    pub fn is_light_on(&self) -> bool {
        match &self.controller {
            Some(controller) => controller.get_state(),
            None => self.last_handoff.map_or(false, |h| h.light_is_on),
        }
    }

    /// Starts the first controller.
    pub async fn on_startup(&mut self) -> Result<(), LightError> {
        info!("Starting chamber lighting");
        self.reinitialize().await
    }

    /// Replaces the settings and rebuilds the controller.
    pub async fn on_settings_saved(&mut self, settings: LightingSettings) -> Result<(), LightError> {
        info!("Lighting settings saved: {:?}", settings);
        self.settings = settings;
        self.reinitialize().await
    }

    /// Applies a host event.
    ///
    /// Printer events only rebuild the controller when they change the
    /// effective mode.
    pub async fn on_event(&mut self, event: HostEvent) -> Result<(), LightError> {
        if event == HostEvent::SettingsChanged {
            return self.reinitialize().await;
        }

        let before = self.effective_mode();
        self.printer.apply(event);
        let after = self.effective_mode();
        if before != after {
            info!("{:?}: lighting mode {} -> {}", event, before, after);
            self.reinitialize().await
        } else {
            Ok(())
        }
    }

    /// Cycles the configured mode, stores it and rebuilds the controller.
    ///
    /// Returns the new configured mode. The setting is kept even if the
    /// rebuild fails.
    pub async fn next_mode(&mut self) -> Result<LightMode, LightError> {
        let next = self.settings.lighting_mode.next();
        info!(
            "Changing lighting mode {} -> {}",
            self.settings.lighting_mode, next
        );
        self.settings.lighting_mode = next;
        self.reinitialize().await?;
        Ok(next)
    }

    /// Routes a host API command by name.
    ///
    /// # Errors
    ///
    /// [`LightError::UnknownCommand`] for names not in [`ApiCommand`], or any
    /// error from rebuilding the controller.
    pub async fn handle_api_command(&mut self, name: &str) -> Result<ApiReply, LightError> {
        let command = ApiCommand::parse(name).map_err(|e| {
            error!("Bad lighting command: {}", name);
            e
        })?;
        match command {
            ApiCommand::AreLightsOn => Ok(ApiReply::state(self.is_light_on())),
            ApiCommand::NextLightingState => self.next_mode().await.map(ApiReply::mode),
        }
    }

    /// Releases the running controller, if any.
    ///
    /// The hardware backend is kept, so a later
    /// [`on_startup`](Self::on_startup) drives the same pins.
    pub async fn shutdown(&mut self) -> Option<Handoff> {
        let controller = self.controller.take()?;
        Some(self.release(controller).await)
    }

    async fn release(&mut self, controller: LightController) -> Handoff {
        let (handoff, pins) = controller.release_backend().await;
        self.last_handoff = Some(handoff);
        // The logging fallback is not worth keeping.
        self.spare = pins.filter(|_| handoff.hardware_present);
        handoff
    }

    async fn reinitialize(&mut self) -> Result<(), LightError> {
        if let Some(controller) = self.controller.take() {
            self.release(controller).await;
        }

        let config = self.settings.controller_config(self.effective_mode());
        let spare = self.spare.take();
        let detect = &self.probe;
        let backend = move || match spare {
            Some(pins) => Capability::Available(pins),
            None => detect(),
        };
        match LightController::start_with(config, self.last_handoff, backend) {
            Ok(controller) => {
                if !controller.hardware_present() && self.last_handoff.is_none() {
                    warn!("Chamber lighting running without GPIO hardware");
                }
                self.controller = Some(controller);
                Ok(())
            }
            Err(e) => {
                error!("Failed to start light controller: {}", e);
                Err(e)
            }
        }
    }
}

impl<P> fmt::Debug for Supervisor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("settings", &self.settings)
            .field("printer", &self.printer)
            .field("controller", &self.controller)
            .field("last_handoff", &self.last_handoff)
            .field("spare", &self.spare.as_ref().map(|pins| pins.backend_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockPins;
    use crate::traits::{DigitalPins, Level, PinError, PinMode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const RELAY: u8 = 27;
    const DOOR: u8 = 17;

    // Relay "on" is LOW by default.
    fn settings(mode: LightMode) -> LightingSettings {
        LightingSettings::default()
            .with_mode(mode)
            .with_pins(RELAY, DOOR)
    }

    fn supervisor(
        settings: LightingSettings,
        pins: &MockPins,
    ) -> Supervisor<impl Fn() -> Capability> {
        let pins = pins.clone();
        Supervisor::with_probe(settings, move || Capability::available(pins.clone()))
    }

    #[test]
    fn event_names() {
        assert_eq!(
            HostEvent::from_name("SettingsUpdated"),
            Some(HostEvent::SettingsChanged)
        );
        assert_eq!(HostEvent::from_name("Connected"), Some(HostEvent::Connected));
        assert_eq!(
            HostEvent::from_name("PrintResumed"),
            Some(HostEvent::PrintStarted)
        );
        assert_eq!(
            HostEvent::from_name("PrintCancelled"),
            Some(HostEvent::PrintStopped)
        );
        assert_eq!(HostEvent::from_name("Upload"), None);
    }

    #[test]
    fn printer_status_tracking() {
        let mut status = PrinterStatus::default();
        status.apply(HostEvent::PrintStarted);
        assert_eq!(
            status,
            PrinterStatus {
                connected: true,
                printing: true
            }
        );
        status.apply(HostEvent::PrintStopped);
        assert!(status.connected && !status.printing);
        status.apply(HostEvent::PrintStarted);
        status.apply(HostEvent::Disconnected);
        assert_eq!(status, PrinterStatus::default());
    }

    #[tokio::test(start_paused = true)]
    async fn startup_drives_configured_mode() {
        let pins = MockPins::new();
        let mut sup = supervisor(settings(LightMode::On), &pins);
        sup.on_startup().await.unwrap();

        assert!(sup.is_light_on());
        assert_eq!(pins.level(RELAY), Some(Level::Low));
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn default_settings_start() {
        let pins = MockPins::new();
        let mut sup = supervisor(LightingSettings::default(), &pins);

        // Both pins default to 0; ON mode never reads the door
        sup.on_startup().await.unwrap();
        assert!(sup.is_light_on());
        assert_eq!(pins.level(0), Some(Level::Low));
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn next_mode_cycles_and_persists() {
        let pins = MockPins::new();
        let mut sup = supervisor(settings(LightMode::On), &pins);
        sup.on_startup().await.unwrap();

        assert_eq!(sup.next_mode().await.unwrap(), LightMode::Off);
        assert_eq!(sup.settings().lighting_mode, LightMode::Off);
        assert!(!sup.is_light_on());
        assert_eq!(pins.level(RELAY), Some(Level::High));

        assert_eq!(sup.next_mode().await.unwrap(), LightMode::Manual);
        assert_eq!(sup.controller().map(|c| c.mode()), Some(LightMode::Manual));
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rebuild_hands_state_over_without_toggle() {
        let pins = MockPins::new();
        let mut sup = supervisor(settings(LightMode::On), &pins);
        sup.on_startup().await.unwrap();

        sup.on_settings_saved(settings(LightMode::On).with_hold_ms(1000))
            .await
            .unwrap();

        assert!(sup.is_light_on());
        assert!(pins.writes(RELAY).iter().all(|l| *l == Level::Low));
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn print_forces_light_on() {
        let pins = MockPins::new();
        let settings = settings(LightMode::Off).with_auto_turn_on_when(AutoTurnOnWhen::Printing);
        let mut sup = supervisor(settings, &pins);
        sup.on_startup().await.unwrap();
        assert!(!sup.is_light_on());

        sup.on_event(HostEvent::Connected).await.unwrap();
        assert!(!sup.is_light_on());

        sup.on_event(HostEvent::PrintStarted).await.unwrap();
        assert_eq!(sup.effective_mode(), LightMode::On);
        assert!(sup.is_light_on());

        sup.on_event(HostEvent::PrintStopped).await.unwrap();
        assert_eq!(sup.effective_mode(), LightMode::Off);
        assert!(!sup.is_light_on());
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn connection_forces_light_on() {
        let pins = MockPins::new();
        let settings = settings(LightMode::Off).with_auto_turn_on_when(AutoTurnOnWhen::Connected);
        let mut sup = supervisor(settings, &pins);
        sup.on_startup().await.unwrap();

        sup.on_event(HostEvent::Connected).await.unwrap();
        assert!(sup.is_light_on());
        sup.on_event(HostEvent::Disconnected).await.unwrap();
        assert!(!sup.is_light_on());
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_events_do_not_rebuild() {
        let pins = MockPins::new();
        let mut sup = supervisor(settings(LightMode::On), &pins);
        sup.on_startup().await.unwrap();
        let writes = pins.write_count(RELAY);

        sup.on_event(HostEvent::PrintStarted).await.unwrap();
        sup.on_event(HostEvent::PrintStopped).await.unwrap();

        assert_eq!(pins.write_count(RELAY), writes);
        sup.shutdown().await;
    }

    /// Backend that owns its pins like a board HAL driver: no `Clone`, and
    /// only obtainable once.
    struct OwnedPins(MockPins);

    impl DigitalPins for OwnedPins {
        fn backend_name(&self) -> &'static str {
            "owned"
        }

        fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PinError> {
            self.0.configure(pin, mode)
        }

        fn write(&mut self, pin: u8, level: Level) -> Result<(), PinError> {
            self.0.write(pin, level)
        }

        fn read(&mut self, pin: u8) -> Result<Level, PinError> {
            self.0.read(pin)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn owned_backend_survives_rebuilds() {
        let pins = MockPins::new();
        let owned = Mutex::new(Some(OwnedPins(pins.clone())));
        let detections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&detections);
        let mut sup = Supervisor::with_probe(settings(LightMode::On), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            match owned.lock().unwrap().take() {
                Some(backend) => Capability::available(backend),
                None => Capability::Unavailable,
            }
        });

        sup.on_startup().await.unwrap();
        assert_eq!(sup.next_mode().await.unwrap(), LightMode::Off);
        assert_eq!(sup.next_mode().await.unwrap(), LightMode::Manual);

        let controller = sup.controller().unwrap();
        assert!(controller.hardware_present());
        assert_eq!(controller.backend_name(), "owned");

        // Still wired to the same pins
        pins.set_input(DOOR, Level::High);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(sup.is_light_on());
        assert_eq!(pins.level(RELAY), Some(Level::Low));

        // Shutdown keeps the backend for the next startup
        sup.shutdown().await;
        sup.on_startup().await.unwrap();
        assert_eq!(sup.controller().map(|c| c.backend_name()), Some("owned"));
        assert_eq!(detections.load(Ordering::SeqCst), 1);
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn detection_skipped_after_missing_hardware() {
        let detections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&detections);
        let mut sup = Supervisor::with_probe(settings(LightMode::On), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Capability::Unavailable
        });

        sup.on_startup().await.unwrap();
        sup.next_mode().await.unwrap();
        sup.next_mode().await.unwrap();

        assert_eq!(detections.load(Ordering::SeqCst), 1);
        assert_eq!(sup.controller().map(|c| c.hardware_present()), Some(false));
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn api_commands() {
        let pins = MockPins::new();
        let mut sup = supervisor(settings(LightMode::On), &pins);
        sup.on_startup().await.unwrap();

        assert_eq!(
            sup.handle_api_command("are_lights_turn_on").await,
            Ok(ApiReply::state(true))
        );
        assert_eq!(
            sup.handle_api_command("next_lighitng_state").await,
            Ok(ApiReply::mode(LightMode::Off))
        );
        assert_eq!(
            sup.handle_api_command("are_lights_turn_on").await,
            Ok(ApiReply::state(false))
        );
        assert_eq!(
            sup.handle_api_command("self_destruct").await,
            Err(LightError::UnknownCommand("self_destruct".into()))
        );
        sup.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_keeps_last_state() {
        let pins = MockPins::new();
        let mut sup = supervisor(settings(LightMode::On), &pins);
        sup.on_startup().await.unwrap();

        let handoff = sup.shutdown().await.unwrap();
        assert!(handoff.light_is_on);
        assert!(handoff.hardware_present);
        assert!(sup.controller().is_none());
        assert!(sup.is_light_on());
        assert_eq!(sup.shutdown().await, None);
    }
}
