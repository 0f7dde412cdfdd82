//! Shared control state.
//!
//! One [`ControlState`] is created at boot and handed out as
//! `Arc<ControlState>` to the drive loop, the indicator loop, the telemetry
//! broadcaster and the command dispatcher.  Every field is its own atomic
//! cell: readers may observe a value that is one update behind, but never a
//! torn one, and no activity ever waits on another to read or write.
//!
//! | Field                 | Writer              | Persisted |
//! |-----------------------|---------------------|-----------|
//! | `current_speed`       | drive loop          | no        |
//! | `max_forward`         | command dispatcher  | yes       |
//! | `max_backward`        | command dispatcher  | yes       |
//! | `emergency_stop`      | command dispatcher  | no        |
//! | `indicator_period_ms` | drive loop          | no        |
//! | `forward_throttle`    | drive loop          | no        |

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use log::{info, warn};

use crate::app::commands::LIMIT_RANGE;
use crate::app::events::StateSnapshot;
use crate::app::ports::StoragePort;
use crate::config::{DriveConfig, KEY_MAX_BACKWARD, KEY_MAX_FORWARD};
use crate::control::indicator::IDLE_PERIOD_MS;

/// `f32` stored as its bit pattern in an `AtomicU32`.
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct ControlState {
    current_speed: AtomicF32,
    max_forward: AtomicF32,
    max_backward: AtomicF32,
    emergency_stop: AtomicBool,
    indicator_period_ms: AtomicU32,
    forward_throttle: AtomicU8,
}

impl ControlState {
    /// Fresh state at rest with the given speed limits.
    pub fn new(max_forward: f32, max_backward: f32) -> Self {
        Self {
            current_speed: AtomicF32::new(0.0),
            max_forward: AtomicF32::new(max_forward),
            max_backward: AtomicF32::new(max_backward),
            emergency_stop: AtomicBool::new(false),
            indicator_period_ms: AtomicU32::new(IDLE_PERIOD_MS),
            forward_throttle: AtomicU8::new(0),
        }
    }

    /// Build the boot state, reading the speed limits from storage.
    ///
    /// The emergency stop always starts released: it is never persisted.
    /// A stored limit that is not a finite value in `0..=100` is replaced
    /// by the configured default.
    pub fn load(storage: &impl StoragePort, config: &DriveConfig) -> Self {
        let max_forward = stored_limit(storage, KEY_MAX_FORWARD, config.default_max_forward);
        let max_backward = stored_limit(storage, KEY_MAX_BACKWARD, config.default_max_backward);
        info!(
            "ControlState: limits forward={:.1}% backward={:.1}%",
            max_forward, max_backward
        );
        Self::new(max_forward, max_backward)
    }

    // ── Speed ────────────────────────────────────────────────

    pub fn current_speed(&self) -> f32 {
        self.current_speed.load()
    }

    pub fn set_current_speed(&self, speed: f32) {
        self.current_speed.store(speed);
    }

    // ── Limits ───────────────────────────────────────────────

    pub fn max_forward(&self) -> f32 {
        self.max_forward.load()
    }

    pub fn max_backward(&self) -> f32 {
        self.max_backward.load()
    }

    /// Replace both limits.  Takes effect on the next drive tick.
    pub fn set_limits(&self, max_forward: f32, max_backward: f32) {
        self.max_forward.store(max_forward);
        self.max_backward.store(max_backward);
    }

    // ── Emergency stop ───────────────────────────────────────

    pub fn emergency_stop(&self) -> bool {
        self.emergency_stop.load(Ordering::Acquire)
    }

    pub fn set_emergency_stop(&self, enabled: bool) {
        self.emergency_stop.store(enabled, Ordering::Release);
    }

    // ── Indicator ────────────────────────────────────────────

    pub fn indicator_period_ms(&self) -> u32 {
        self.indicator_period_ms.load(Ordering::Relaxed)
    }

    pub fn set_indicator_period_ms(&self, period_ms: u32) {
        self.indicator_period_ms.store(period_ms, Ordering::Relaxed);
    }

    // ── Throttle mirror ──────────────────────────────────────

    /// Last sampled forward pedal intensity (0–100).
    pub fn forward_throttle(&self) -> u8 {
        self.forward_throttle.load(Ordering::Relaxed)
    }

    pub fn set_forward_throttle(&self, intensity: u8) {
        self.forward_throttle.store(intensity, Ordering::Relaxed);
    }

    /// Full-state snapshot for broadcast.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            current_speed: self.current_speed(),
            max_forward: self.max_forward(),
            max_backward: self.max_backward(),
            emergency_stop: self.emergency_stop(),
        }
    }
}

fn stored_limit(storage: &impl StoragePort, key: &str, default: f32) -> f32 {
    let value = storage.get_float(key, default);
    if value.is_finite() && LIMIT_RANGE.contains(&value) {
        value
    } else {
        warn!("ControlState: stored {} {} out of range, using {:.1}", key, value, default);
        default
    }
}
