//! Speed ramp: the drive loop's safety law.
//!
//! Speeds are signed percentages of full duty: positive is forward,
//! negative is backward, range `[-100, 100]`.
//!
//! ```text
//!   -100        -50   -10  0      15          50           100
//!    |◀─ 0.08/ms ─▶|◀0.04▶|▓▓|▓▓▓▓▓▓|◀─ 0.04/ms ─▶|◀─ 0.08/ms ─▶|
//!                         snap zones (never lingered in)
//! ```
//!
//! Moving away from zero is iteration-paced (a fixed step per tick).
//! Moving toward zero is time-paced (rate × elapsed ms), so braking
//! finishes within a fixed real-time window even when ticks run late.

/// Forward speeds in `(0, 15)` are never delivered.
pub const FORWARD_SHUTOFF_THRESHOLD: f32 = 15.0;

/// Backward speeds in `(-10, 0)` are never delivered.
pub const BACKWARD_SHUTOFF_THRESHOLD: f32 = 10.0;

/// Per-tick step when accelerating away from zero.
pub const SPEED_INCREMENT: f32 = 0.5;

/// Braking rate above [`FAST_BRAKE_ABOVE`] (% per ms).
pub const FAST_BRAKE_RATE: f32 = 0.08;

/// Braking rate at or below [`FAST_BRAKE_ABOVE`] (% per ms).
pub const SLOW_BRAKE_RATE: f32 = 0.04;

/// Magnitude above which braking uses [`FAST_BRAKE_RATE`].
pub const FAST_BRAKE_ABOVE: f32 = 50.0;

fn brake_rate(current: f32) -> f32 {
    if current.abs() > FAST_BRAKE_ABOVE {
        FAST_BRAKE_RATE
    } else {
        SLOW_BRAKE_RATE
    }
}

/// Advance `current` one tick toward `target`.
///
/// `delta_ms` is the wall-clock time since the previous tick; it only
/// affects braking.  The result never passes `target`, except that a snap
/// to zero from inside a snap zone is always taken.  Reverse speeds in
/// `[-10, 0)` rising toward the target stop outright, `-10` included.
pub fn next_speed(current: f32, target: f32, delta_ms: u32) -> f32 {
    let delta = delta_ms as f32;

    if current < target {
        if (-BACKWARD_SHUTOFF_THRESHOLD..0.0).contains(&current) {
            0.0
        } else if current > 0.0 && current < FORWARD_SHUTOFF_THRESHOLD {
            FORWARD_SHUTOFF_THRESHOLD.min(target)
        } else if current < 0.0 {
            (current + delta * brake_rate(current)).min(target)
        } else {
            (current + SPEED_INCREMENT).min(target)
        }
    } else if current > target {
        if current > 0.0 && current < FORWARD_SHUTOFF_THRESHOLD {
            0.0
        } else if current < 0.0 && current > -BACKWARD_SHUTOFF_THRESHOLD {
            (-BACKWARD_SHUTOFF_THRESHOLD).max(target)
        } else if current > 0.0 {
            (current - delta * brake_rate(current)).max(target)
        } else {
            (current - SPEED_INCREMENT).max(target)
        }
    } else {
        current
    }
}

/// Desired speed for the given pedal intensities (each 0–100).
///
/// Neither or both pedals pressed means stop.
pub fn speed_target(forward: u8, backward: u8, max_forward: f32, max_backward: f32) -> f32 {
    match (forward, backward) {
        (0, 0) => 0.0,
        (f, 0) => max_forward.min(max_forward * f32::from(f) / 100.0),
        (0, b) => (-max_backward).max(-max_backward * f32::from(b) / 100.0),
        _ => 0.0,
    }
}
