//! Debounced digital gas pedal.
//!
//! ## Hardware
//!
//! Each pedal position is a switch to ground with the GPIO internal
//! pull-up enabled: LOW = pressed.  The drive loop polls every tick; a
//! change is accepted after [`DEBOUNCE_SAMPLES`] consecutive agreeing reads.
//!
//! A read error counts as "released", so a faulty input can only slow the
//! vehicle down.

use embedded_hal::digital::InputPin;

/// Consecutive identical reads needed to accept a new pedal state.
pub const DEBOUNCE_SAMPLES: u8 = 2;

/// Intensity reported while pressed (digital pedals are all-or-nothing).
pub const FULL_INTENSITY: u8 = 100;

pub struct PedalInput<P: InputPin> {
    pin: P,
    name: &'static str,
    stable: bool,
    candidate: bool,
    agree: u8,
}

impl<P: InputPin> PedalInput<P> {
    pub fn new(pin: P, name: &'static str) -> Self {
        Self {
            pin,
            name,
            stable: false,
            candidate: false,
            agree: 0,
        }
    }

    fn raw_pressed(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                log::warn!("pedal {}: read failed ({:?}), treating as released", self.name, e);
                false
            }
        }
    }

    /// Sample the pin and return the debounced state.
    pub fn sample(&mut self) -> bool {
        let raw = self.raw_pressed();
        if raw == self.stable {
            self.agree = 0;
            return self.stable;
        }

        if raw == self.candidate {
            self.agree = self.agree.saturating_add(1);
        } else {
            self.candidate = raw;
            self.agree = 1;
        }

        if self.agree >= DEBOUNCE_SAMPLES {
            self.stable = raw;
            self.agree = 0;
        }
        self.stable
    }

    /// Sample and map to an intensity: 0 or [`FULL_INTENSITY`].
    pub fn intensity(&mut self) -> u8 {
        if self.sample() { FULL_INTENSITY } else { 0 }
    }
}
