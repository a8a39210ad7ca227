//! Desktop simulation of the enclosure light.
//!
//! Runs the supervisor against mock pins and plays a short scripted session:
//! the door opens and closes in AUTO mode, a print starts with the
//! "turn on while printing" override, and the navbar button cycles modes.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=info cargo run --example desktop_sim
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use chamber_lighting::hal::{Capability, MockPins};
use chamber_lighting::traits::Level;
use chamber_lighting::{AutoTurnOnWhen, HostEvent, LightMode, LightingSettings, Supervisor};
use log::info;
use tokio::time::sleep;

const RELAY: u8 = 27;
const DOOR: u8 = 17;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pins = MockPins::new();
    let settings = LightingSettings::default()
        .with_mode(LightMode::Auto)
        .with_pins(RELAY, DOOR)
        .with_relay_on_level(Level::High)
        .with_door_open_level(Level::High)
        .with_hold_ms(2000)
        .with_auto_turn_on_when(AutoTurnOnWhen::Printing);

    let backend = pins.clone();
    let mut supervisor =
        Supervisor::with_probe(settings, move || Capability::available(backend.clone()));
    supervisor
        .on_startup()
        .await
        .context("starting light controller")?;

    info!("--- door opens");
    pins.set_input(DOOR, Level::High);
    sleep(Duration::from_millis(500)).await;
    report(&supervisor, &pins);

    info!("--- door closes, light holds for 2 s");
    pins.set_input(DOOR, Level::Low);
    sleep(Duration::from_millis(1000)).await;
    report(&supervisor, &pins);
    sleep(Duration::from_millis(1500)).await;
    report(&supervisor, &pins);

    info!("--- print starts");
    supervisor.on_event(HostEvent::PrintStarted).await?;
    report(&supervisor, &pins);

    info!("--- print done");
    supervisor.on_event(HostEvent::PrintStopped).await?;
    report(&supervisor, &pins);

    for _ in 0..LightMode::ALL.len() {
        let reply = supervisor.handle_api_command("next_lighting_state").await?;
        info!("--- navbar click: {:?}", reply);
        sleep(Duration::from_millis(300)).await;
        report(&supervisor, &pins);
    }

    if let Some(handoff) = supervisor.shutdown().await {
        info!("shut down with {:?}", handoff);
    }
    Ok(())
}

fn report<P>(supervisor: &Supervisor<P>, pins: &MockPins)
where
    P: Fn() -> Capability,
{
    info!(
        "mode {} | light {} | relay GPIO{} = {:?}",
        supervisor.effective_mode(),
        if supervisor.is_light_on() { "on" } else { "off" },
        RELAY,
        pins.level(RELAY)
    );
}
