//! Drive control loop.
//!
//! ```text
//!   pedals ──▶ speed_target ──▶ next_speed ──▶ duty_for_speed ──▶ motor
//!                  ▲                 ▲                               │
//!            max_fwd/max_bwd     delta_ms            indicator period, speed
//!                  └────────── ControlState ◀─────────────────────────┘
//! ```
//!
//! Every tick ends with the motor outputs matching `current_speed`.  A
//! failed motor write puts the vehicle in the safe state (outputs off,
//! emergency stop latched, speed zero) and is returned to the caller,
//! which must not keep ticking.

use std::sync::Arc;
use std::time::Duration;

use log::{error, warn};

use crate::app::ports::{MotorChannel, MotorPort, ThrottlePort};
use crate::app::state::ControlState;
use crate::config::DriveConfig;
use crate::control::indicator::indicator_period_ms;
use crate::control::ramp::{next_speed, speed_target};
use crate::error::ActuatorError;

/// Raw duty values for the two motor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DutyPair {
    pub forward: u16,
    pub backward: u16,
}

/// Map a signed speed to channel duties.
///
/// At most one channel is ever non-zero.  Speeds outside `[-100, 100]`
/// (or NaN) yield `None` and must leave the outputs untouched.
pub fn duty_for_speed(speed: f32, max_duty: u16) -> Option<DutyPair> {
    if !(-100.0..=100.0).contains(&speed) {
        return None;
    }
    let scaled = (speed.abs() / 100.0 * f32::from(max_duty)).round() as u16;
    Some(if speed > 0.0 {
        DutyPair { forward: scaled, backward: 0 }
    } else if speed < 0.0 {
        DutyPair { forward: 0, backward: scaled }
    } else {
        DutyPair::default()
    })
}

pub struct DriveLoop<H: ThrottlePort + MotorPort> {
    hw: H,
    state: Arc<ControlState>,
    last_update_ms: u64,
    drive_interval: Duration,
    emergency_interval: Duration,
}

impl<H: ThrottlePort + MotorPort> DriveLoop<H> {
    /// `now_ms` seeds the elapsed-time measurement of the first tick.
    pub fn new(hw: H, state: Arc<ControlState>, config: &DriveConfig, now_ms: u64) -> Self {
        Self {
            hw,
            state,
            last_update_ms: now_ms,
            drive_interval: Duration::from_millis(u64::from(config.drive_interval_ms)),
            emergency_interval: Duration::from_millis(u64::from(config.emergency_interval_ms)),
        }
    }

    /// Run one control tick at time `now_ms` and return the delay before
    /// the next one.
    pub fn tick(&mut self, now_ms: u64) -> Result<Duration, ActuatorError> {
        let forward = self.hw.forward_intensity();
        let backward = self.hw.backward_intensity();
        self.state.set_forward_throttle(forward);

        if self.state.emergency_stop() {
            self.emit(DutyPair::default())?;
            self.state.set_current_speed(0.0);
            self.state.set_indicator_period_ms(indicator_period_ms(0.0, true));
            self.last_update_ms = now_ms;
            return Ok(self.emergency_interval);
        }

        let target = speed_target(
            forward,
            backward,
            self.state.max_forward(),
            self.state.max_backward(),
        );
        // Overrun ticks just see a larger delta.
        let delta_ms = u32::try_from(now_ms.saturating_sub(self.last_update_ms)).unwrap_or(u32::MAX);
        let speed = next_speed(self.state.current_speed(), target, delta_ms);

        match duty_for_speed(speed, self.hw.max_duty()) {
            Some(duty) => {
                self.emit(duty)?;
                self.state.set_current_speed(speed);
            }
            None => warn!("drive: speed {} out of range, output untouched", speed),
        }

        self.state
            .set_indicator_period_ms(indicator_period_ms(self.state.current_speed(), false));
        self.last_update_ms = now_ms;
        Ok(self.drive_interval)
    }

    fn emit(&mut self, duty: DutyPair) -> Result<(), ActuatorError> {
        let result = self
            .hw
            .set_duty(MotorChannel::Forward, duty.forward)
            .and_then(|()| self.hw.set_duty(MotorChannel::Backward, duty.backward));

        if let Err(e) = result {
            error!("drive: motor output failed ({}), entering safe state", e);
            self.hw.all_off();
            self.state.set_emergency_stop(true);
            self.state.set_current_speed(0.0);
            return Err(e);
        }
        Ok(())
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }
}
