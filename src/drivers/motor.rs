//! Dual-channel PWM motor driver.
//!
//! The H-bridge takes one PWM input per direction.  Both channels share
//! one LEDC timer (25 kHz, 10-bit) on target; on the host any
//! `embedded_hal::pwm::SetDutyCycle` implementation will do.

use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::MotorChannel;
use crate::error::ActuatorError;

pub struct MotorDriver<F: SetDutyCycle, B: SetDutyCycle> {
    forward: F,
    backward: B,
}

impl<F: SetDutyCycle, B: SetDutyCycle> MotorDriver<F, B> {
    pub fn new(forward: F, backward: B) -> Self {
        Self { forward, backward }
    }

    /// Usable full-scale duty (the smaller of the two channels).
    pub fn max_duty(&self) -> u16 {
        self.forward
            .max_duty_cycle()
            .min(self.backward.max_duty_cycle())
    }

    /// Write a raw duty to one channel, clamped to [`Self::max_duty`].
    pub fn set(&mut self, channel: MotorChannel, duty: u16) -> Result<(), ActuatorError> {
        let duty = duty.min(self.max_duty());
        match channel {
            MotorChannel::Forward => self.forward.set_duty_cycle(duty).map_err(|e| {
                log::error!("motor: forward duty {} failed: {:?}", duty, e);
                ActuatorError::ForwardPwmFailed
            }),
            MotorChannel::Backward => self.backward.set_duty_cycle(duty).map_err(|e| {
                log::error!("motor: backward duty {} failed: {:?}", duty, e);
                ActuatorError::BackwardPwmFailed
            }),
        }
    }

    /// Best-effort: both channels to zero, errors ignored.
    pub fn off(&mut self) {
        let _ = self.forward.set_duty_cycle_fully_off();
        let _ = self.backward.set_duty_cycle_fully_off();
    }
}
