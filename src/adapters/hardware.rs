//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! [`DriveHardware`] owns both pedals and the motor driver and exposes
//! them through [`ThrottlePort`] and [`MotorPort`] for the drive loop.
//! The status LED is exposed separately through [`IndicatorPort`] because
//! it belongs to a different task.  Everything is generic over the
//! `embedded-hal` traits, so the same adapter runs against `esp-idf-hal`
//! drivers on target and against plain structs in host tests.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{IndicatorPort, MotorChannel, MotorPort, ThrottlePort};
use crate::drivers::motor::MotorDriver;
use crate::drivers::pedal::PedalInput;
use crate::drivers::status_led::StatusLed;
use crate::error::ActuatorError;

/// Pedals plus motor, owned by the drive task.
pub struct DriveHardware<PF, PB, MF, MB>
where
    PF: InputPin,
    PB: InputPin,
    MF: SetDutyCycle,
    MB: SetDutyCycle,
{
    pedal_forward: PedalInput<PF>,
    pedal_backward: PedalInput<PB>,
    motor: MotorDriver<MF, MB>,
}

impl<PF, PB, MF, MB> DriveHardware<PF, PB, MF, MB>
where
    PF: InputPin,
    PB: InputPin,
    MF: SetDutyCycle,
    MB: SetDutyCycle,
{
    pub fn new(
        pedal_forward: PedalInput<PF>,
        pedal_backward: PedalInput<PB>,
        motor: MotorDriver<MF, MB>,
    ) -> Self {
        Self {
            pedal_forward,
            pedal_backward,
            motor,
        }
    }
}

// ── ThrottlePort implementation ───────────────────────────────

impl<PF, PB, MF, MB> ThrottlePort for DriveHardware<PF, PB, MF, MB>
where
    PF: InputPin,
    PB: InputPin,
    MF: SetDutyCycle,
    MB: SetDutyCycle,
{
    fn forward_intensity(&mut self) -> u8 {
        self.pedal_forward.intensity()
    }

    fn backward_intensity(&mut self) -> u8 {
        self.pedal_backward.intensity()
    }
}

// ── MotorPort implementation ──────────────────────────────────

impl<PF, PB, MF, MB> MotorPort for DriveHardware<PF, PB, MF, MB>
where
    PF: InputPin,
    PB: InputPin,
    MF: SetDutyCycle,
    MB: SetDutyCycle,
{
    fn max_duty(&self) -> u16 {
        self.motor.max_duty()
    }

    fn set_duty(&mut self, channel: MotorChannel, duty: u16) -> Result<(), ActuatorError> {
        self.motor.set(channel, duty)
    }

    fn all_off(&mut self) {
        self.motor.off();
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<P: OutputPin> IndicatorPort for StatusLed<P> {
    fn set_level(&mut self, high: bool) -> Result<(), ActuatorError> {
        self.set(high)
    }
}
