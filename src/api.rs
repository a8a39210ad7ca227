//! Host API commands and their JSON payloads.
//!
//! The host forwards plugin API calls as `{"command": "<name>"}` bodies.
//! Two commands exist: polling the light state for the navbar indicator, and
//! cycling to the next mode when the navbar button is clicked.
//!
//! # Example
//!
//! ```rust
//! use chamber_lighting::api::{ApiCommand, ApiReply};
//!
//! assert_eq!(ApiCommand::from_name("are_lights_turn_on"), Some(ApiCommand::AreLightsOn));
//!
//! # #[cfg(feature = "serde")]
//! assert_eq!(ApiReply::state(true).to_json(), r#"{"state":true}"#);
//! ```

use crate::error::LightError;
use crate::mode::LightMode;

/// Commands the host may route to the lighting plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiCommand {
    /// Cycle the configured mode and rebuild the controller.
    NextLightingState,
    /// Query whether the light is on.
    AreLightsOn,
}

impl ApiCommand {
    /// Canonical command name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ApiCommand::NextLightingState => "next_lighting_state",
            ApiCommand::AreLightsOn => "are_lights_turn_on",
        }
    }

    /// Looks up a command by name.
    ///
    /// The navbar script sends `next_lighitng_state`, so that spelling is
    /// accepted as well.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "next_lighting_state" | "next_lighitng_state" => Some(ApiCommand::NextLightingState),
            "are_lights_turn_on" => Some(ApiCommand::AreLightsOn),
            _ => None,
        }
    }

    /// Like [`from_name`](Self::from_name) but with a host-facing error.
    pub fn parse(name: &str) -> Result<Self, LightError> {
        Self::from_name(name).ok_or_else(|| LightError::UnknownCommand(name.to_string()))
    }

    /// Every command the host should register.
    pub const ALL: [ApiCommand; 2] = [ApiCommand::NextLightingState, ApiCommand::AreLightsOn];
}

/// Result of a routed command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ApiReply {
    /// Reply to [`ApiCommand::AreLightsOn`].
    State {
        /// `true` when the light is on.
        state: bool,
    },
    /// Reply to [`ApiCommand::NextLightingState`].
    Mode {
        /// The newly configured mode, sent by name.
        #[cfg_attr(feature = "serde", serde(serialize_with = "mode_name"))]
        mode: LightMode,
    },
}

impl ApiReply {
    /// Shorthand for a state reply.
    pub const fn state(state: bool) -> Self {
        ApiReply::State { state }
    }

    /// Shorthand for a mode reply.
    pub const fn mode(mode: LightMode) -> Self {
        ApiReply::Mode { mode }
    }
}

/// Request body as sent by the host.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct ApiRequest {
    /// Command name.
    pub command: String,
}

#[cfg(feature = "serde")]
impl ApiRequest {
    /// Parses a JSON request body into a command.
    ///
    /// # Errors
    ///
    /// [`LightError::UnknownCommand`] for malformed bodies and unknown names.
    pub fn parse_command(body: &[u8]) -> Result<ApiCommand, LightError> {
        let request: ApiRequest = serde_json::from_slice(body)
            .map_err(|e| LightError::UnknownCommand(format!("malformed request: {}", e)))?;
        ApiCommand::parse(&request.command)
    }
}

#[cfg(feature = "serde")]
fn mode_name<S: serde::Serializer>(mode: &LightMode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(mode.as_str())
}

#[cfg(feature = "serde")]
impl ApiReply {
    /// Serializes the reply as a JSON object.
    pub fn to_json(&self) -> String {
        // Plain bools and small integers cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
