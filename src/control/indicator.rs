//! Status indicator loop.
//!
//! The on-board LED blinks with a half-period chosen by the drive loop:
//! slow when parked, faster with speed, and a fixed distinct cadence while
//! the emergency stop is latched.

use std::sync::Arc;
use std::time::Duration;

use crate::app::ports::IndicatorPort;
use crate::app::state::ControlState;
use crate::error::ActuatorError;

/// Half-period while the emergency stop is latched.
pub const EMERGENCY_PERIOD_MS: u32 = 200;
/// Half-period when parked.
pub const IDLE_PERIOD_MS: u32 = 1000;
/// Half-period at full speed.
pub const MIN_PERIOD_MS: u32 = 20;
/// Range covered between a crawl and full speed.
const PERIOD_SPAN_MS: f32 = 160.0;

/// Blink half-period for the given drive state.
pub fn indicator_period_ms(speed: f32, emergency: bool) -> u32 {
    if emergency {
        EMERGENCY_PERIOD_MS
    } else if speed == 0.0 {
        IDLE_PERIOD_MS
    } else {
        let fraction = (speed.abs() / 100.0).min(1.0);
        ((1.0 - fraction) * PERIOD_SPAN_MS) as u32 + MIN_PERIOD_MS
    }
}

pub struct IndicatorLoop<L: IndicatorPort> {
    led: L,
    state: Arc<ControlState>,
    level: bool,
}

impl<L: IndicatorPort> IndicatorLoop<L> {
    pub fn new(led: L, state: Arc<ControlState>) -> Self {
        Self {
            led,
            state,
            level: false,
        }
    }

    /// Drive the LED to its next level and return how long to hold it.
    ///
    /// The period is re-read every half-cycle so a new cadence shows up
    /// within one half-period.
    pub fn half_cycle(&mut self) -> Result<Duration, ActuatorError> {
        self.led.set_level(self.level)?;
        self.level = !self.level;
        Ok(Duration::from_millis(u64::from(self.state.indicator_period_ms())))
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}
