//! Standalone enclosure light daemon.
//!
//! Runs the lighting supervisor outside a printer host. Host events and API
//! commands arrive as lines on stdin; API replies are written to stdout as
//! JSON.
//!
//! # Build
//!
//! ```bash
//! # Logging backend only (no GPIO)
//! cargo run --bin chamber_lightd --features daemon -- settings.json
//!
//! # On a Raspberry Pi
//! cargo run --release --bin chamber_lightd --features daemon,rpi -- settings.json
//! ```
//!
//! # Input
//!
//! ```text
//! event PrintStarted
//! api are_lights_turn_on
//! {"command": "next_lighting_state"}
//! settings {"lighting_mode": 1, "auto_light_hold_time": 10000}
//! quit
//! ```
//!
//! The settings file uses the host's key names; missing keys take their
//! defaults.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use chamber_lighting::api::ApiRequest;
use chamber_lighting::{HostEvent, LightingSettings, Supervisor};
use log::{debug, info, warn};
use tokio::runtime::Runtime;

fn load_settings(path: Option<String>) -> Result<LightingSettings> {
    let Some(path) = path else {
        warn!("no settings file given, using defaults");
        return Ok(LightingSettings::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let settings = load_settings(args.next())?;
    if args.next().is_some() {
        bail!("usage: chamber_lightd [settings.json]");
    }

    // The polling task runs on the worker threads while stdin blocks here
    let runtime = Runtime::new().context("starting tokio runtime")?;
    let mut supervisor = Supervisor::new(settings);
    runtime
        .block_on(supervisor.on_startup())
        .context("starting light controller")?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match verb {
            "quit" | "exit" => break,
            "event" => match HostEvent::from_name(rest) {
                Some(event) => {
                    if let Err(e) = runtime.block_on(supervisor.on_event(event)) {
                        warn!("{:?} failed: {}", event, e);
                    }
                }
                None => debug!("ignoring event {}", rest),
            },
            "settings" => match serde_json::from_str::<LightingSettings>(rest) {
                Ok(settings) => {
                    if let Err(e) = runtime.block_on(supervisor.on_settings_saved(settings)) {
                        warn!("settings rejected: {}", e);
                    }
                }
                Err(e) => warn!("malformed settings: {}", e),
            },
            _ => {
                let command = if verb == "api" {
                    rest.to_string()
                } else {
                    match ApiRequest::parse_command(line.as_bytes()) {
                        Ok(command) => command.as_str().to_string(),
                        Err(e) => {
                            warn!("{}", e);
                            continue;
                        }
                    }
                };
                match runtime.block_on(supervisor.handle_api_command(&command)) {
                    Ok(reply) => {
                        writeln!(stdout, "{}", reply.to_json()).context("writing reply")?;
                        stdout.flush().context("writing reply")?;
                    }
                    Err(e) => warn!("{}", e),
                }
            }
        }
    }

    if let Some(handoff) = runtime.block_on(supervisor.shutdown()) {
        info!(
            "shut down, light left {}",
            if handoff.light_is_on { "on" } else { "off" }
        );
    }
    Ok(())
}
