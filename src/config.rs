//! System configuration parameters
//!
//! Tunables for the drive controller.  The speed limits here are only the
//! first-boot defaults; the live limits are loaded from NVS at startup and
//! changed at runtime through the `update_max` command.

use serde::{Deserialize, Serialize};

/// Listener table capacity (connected websocket clients).
pub const MAX_LISTENERS: usize = 4;

/// Inbound-message consumer table capacity.
pub const MAX_CONSUMERS: usize = 4;

/// NVS key for the persisted forward speed limit.
pub const KEY_MAX_FORWARD: &str = "max_forward";

/// NVS key for the persisted backward speed limit.
pub const KEY_MAX_BACKWARD: &str = "max_backward";

/// Core drive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    // --- Speed limits (first boot) ---
    /// Default forward speed limit (0-100%)
    pub default_max_forward: f32,
    /// Default backward speed limit (0-100%)
    pub default_max_backward: f32,

    // --- Timing ---
    /// Drive loop period (milliseconds)
    pub drive_interval_ms: u32,
    /// Drive loop idle period while the emergency stop is latched (milliseconds)
    pub emergency_interval_ms: u32,
    /// Telemetry broadcast period (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Inbound command queue polling period (milliseconds)
    pub command_poll_ms: u32,

    // --- Motor PWM ---
    /// LEDC base frequency for the motor driver
    pub motor_pwm_freq_hz: u32,
    /// LEDC duty resolution (bits)
    pub motor_pwm_resolution_bits: u8,

    // --- Transport ---
    /// URI the websocket endpoint is registered under
    pub ws_path: heapless::String<16>,
    /// NVS namespace holding the speed limits
    pub nvs_namespace: heapless::String<16>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        let mut ws_path = heapless::String::new();
        let _ = ws_path.push_str("/ws");
        let mut nvs_namespace = heapless::String::new();
        let _ = nvs_namespace.push_str("storage");

        Self {
            // With an 18 V pack, 66% is roughly a 12 V motor's rating
            default_max_forward: 60.0,
            default_max_backward: 35.0,

            // Timing
            drive_interval_ms: 20,     // 50 Hz
            emergency_interval_ms: 50, // 20 Hz
            telemetry_interval_ms: 250, // 4 Hz
            command_poll_ms: 10,

            // Motor PWM
            motor_pwm_freq_hz: 25_000, // inaudible
            motor_pwm_resolution_bits: 10,

            ws_path,
            nvs_namespace,
        }
    }
}
