//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DriveLoop / CommandService (domain)
//! ```
//!
//! Driven adapters (pedals, motor, indicator, storage, clock, broadcast
//! transport) implement these traits.  The periodic activities and the
//! command dispatcher consume them via generics, so the domain core never
//! touches hardware directly and runs unchanged on the host under test.

use crate::error::ActuatorError;

// ───────────────────────────────────────────────────────────────
// Throttle port (driven adapter: pedals → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the drive loop samples pedal intensities through this.
pub trait ThrottlePort {
    /// Debounced forward pedal intensity, 0–100.
    fn forward_intensity(&mut self) -> u8;

    /// Debounced backward pedal intensity, 0–100.
    fn backward_intensity(&mut self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Motor port (driven adapter: domain → H-bridge PWM)
// ───────────────────────────────────────────────────────────────

/// One of the two PWM channels feeding the motor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorChannel {
    Forward,
    Backward,
}

/// Write-side port: the drive loop emits duty cycles through this.
pub trait MotorPort {
    /// Full-scale duty value of the PWM hardware (e.g. 1023 for 10 bits).
    fn max_duty(&self) -> u16;

    /// Apply a raw duty value to one channel.  Failure is fatal to the caller.
    fn set_duty(&mut self, channel: MotorChannel, duty: u16) -> Result<(), ActuatorError>;

    /// Best-effort zeroing of both channels; used on the fatal path.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → status LED)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    fn set_level(&mut self, high: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Broadcast port (domain → every connected listener)
// ───────────────────────────────────────────────────────────────

/// Fan-out of one text payload to all connected listeners.
///
/// Delivery failures are handled inside the implementation (the failing
/// listener is dropped), so there is nothing to report back.
pub trait BroadcastPort {
    fn broadcast(&self, payload: &str);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Persistent float-by-key storage.
///
/// Shared between the command dispatcher (which runs on the transport's
/// task) and bootstrap code, hence `&self` receivers.
///
/// # Contract
///
/// - `get_float` returns `default` when the key is absent, unreadable, or
///   stored with a size other than 4 bytes.
/// - `set_float` commits synchronously; `Ok` means the value survives a
///   power cycle.
pub trait StoragePort {
    fn get_float(&self, key: &str, default: f32) -> f32;

    fn set_float(&self, key: &str, value: f32) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error (open, write, or commit failed).
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}

// ───────────────────────────────────────────────────────────────
// Command consumer (driving port: inbound text → domain)
// ───────────────────────────────────────────────────────────────

/// Callback registered with the Command Channel.
///
/// Invoked synchronously, in registration order, for every inbound text
/// payload.  `reply` fans a response out to every connected listener.
/// An `Err` is logged by the channel and never stops later consumers.
pub trait CommandConsumer: Send + Sync {
    fn on_message(
        &self,
        payload: &str,
        reply: &dyn BroadcastPort,
    ) -> Result<(), crate::error::CommandError>;
}
