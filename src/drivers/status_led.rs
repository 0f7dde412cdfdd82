//! Single-colour status LED driver.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: a `PinDriver` output on GPIO2.
//! On host/test: any `embedded_hal::digital::OutputPin`.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ActuatorError;

pub struct StatusLed<P: OutputPin> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, lit: false }
    }

    pub fn set(&mut self, lit: bool) -> Result<(), ActuatorError> {
        self.pin
            .set_state(PinState::from(lit))
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.lit = lit;
        Ok(())
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
