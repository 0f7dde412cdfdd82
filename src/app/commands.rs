//! Inbound commands from remote controllers.
//!
//! Wire format (one JSON object per message):
//!
//! ```text
//! {"command":"update_max","parameters":{"max_forward":70,"max_backward":30}}
//! {"command":"read"}
//! {"command":"read_throttle"}
//! {"command":"emergency_stop","parameters":{"is_enabled":true}}
//! ```
//!
//! [`Command::parse`] only decodes and validates; applying a command is the
//! job of [`CommandService`](super::service::CommandService).

use serde::Deserialize;
use serde_json::Value;

use crate::error::CommandError;

/// Inclusive bounds for a remotely set speed limit (percent of full duty).
pub const LIMIT_RANGE: core::ops::RangeInclusive<f32> = 0.0..=100.0;

/// Decoded inbound command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Replace both speed limits and persist them.
    UpdateMax { forward: f32, backward: f32 },
    /// Broadcast the full state snapshot.
    Read,
    /// Broadcast the forward pedal position.
    ReadThrottle,
    /// Latch or release the emergency stop.
    EmergencyStop { enabled: bool },
    /// Well-formed envelope with an unrecognised tag; ignored.
    Unknown,
}

#[derive(Deserialize)]
struct Envelope {
    command: String,
    #[serde(default)]
    parameters: Option<Value>,
}

impl Command {
    /// Decode one text payload.
    ///
    /// Anything that is not a JSON object with a string `command` field is
    /// [`CommandError::Malformed`].  A known tag with a missing or wrongly
    /// typed parameter is rejected; an unknown tag decodes to
    /// [`Command::Unknown`].
    pub fn parse(payload: &str) -> Result<Self, CommandError> {
        let envelope: Envelope =
            serde_json::from_str(payload).map_err(|_| CommandError::Malformed)?;

        match envelope.command.as_str() {
            "update_max" => {
                let params = envelope.parameters.ok_or(CommandError::MissingParameters)?;
                let forward = limit_param(&params, "max_forward")?;
                let backward = limit_param(&params, "max_backward")?;
                Ok(Self::UpdateMax { forward, backward })
            }
            "read" => Ok(Self::Read),
            "read_throttle" => Ok(Self::ReadThrottle),
            "emergency_stop" => {
                let params = envelope.parameters.ok_or(CommandError::MissingParameters)?;
                let enabled = params
                    .get("is_enabled")
                    .and_then(Value::as_bool)
                    .ok_or(CommandError::InvalidParameter("is_enabled"))?;
                Ok(Self::EmergencyStop { enabled })
            }
            _ => Ok(Self::Unknown),
        }
    }
}

fn limit_param(params: &Value, field: &'static str) -> Result<f32, CommandError> {
    let value = params
        .get(field)
        .and_then(Value::as_f64)
        .ok_or(CommandError::InvalidParameter(field))? as f32;

    if value.is_finite() && LIMIT_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(CommandError::InvalidParameter(field))
    }
}
