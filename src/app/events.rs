//! Outbound telemetry payloads.
//!
//! These are the JSON objects broadcast over the Command Channel.  Field
//! names are part of the wire contract with the web UI.

use serde::Serialize;

/// Full-state snapshot, sent after every state-changing command and on `read`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub current_speed: f32,
    pub max_forward: f32,
    pub max_backward: f32,
    pub emergency_stop: bool,
}

/// Speed-only snapshot, sent by the telemetry broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedSnapshot {
    pub current_speed: f32,
}

/// Forward pedal position as a 0.0–1.0 fraction, sent on `read_throttle`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThrottleSnapshot {
    pub current_throttle: f32,
}

/// Serialise a snapshot to its wire text.
///
/// The snapshot types hold only plain numbers and booleans, so this cannot
/// fail in practice; a failure degrades to an empty object.
pub fn to_payload<T: Serialize>(snapshot: &T) -> String {
    serde_json::to_string(snapshot).unwrap_or_else(|e| {
        log::warn!("snapshot serialisation failed: {}", e);
        String::from("{}")
    })
}
