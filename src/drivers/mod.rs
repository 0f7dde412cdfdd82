//! Peripheral drivers and task helpers.

pub mod motor;
pub mod pedal;
pub mod status_led;
pub mod task_pin;
pub mod watchdog;
