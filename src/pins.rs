//! GPIO / peripheral pin assignments for the drive controller board.
//!
//! Single source of truth for the wiring.  `main` hands the matching
//! `esp_idf_hal` pin peripherals to the drivers; these constants document
//! the numbers and are used in log output.

// ---------------------------------------------------------------------------
// Pedals (digital, active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// Gas pedal, forward position.  LOW = pressed.
pub const PEDAL_FORWARD_GPIO: i32 = 32;
/// Gas pedal, backward position.  LOW = pressed.
pub const PEDAL_BACKWARD_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Motor driver (dual PWM H-bridge input)
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the motor forward.
pub const MOTOR_FORWARD_PWM_GPIO: i32 = 18;
/// LEDC PWM output driving the motor backward.
pub const MOTOR_BACKWARD_PWM_GPIO: i32 = 19;

/// LEDC channel numbers (timer 1 shared by both).
pub const LEDC_CH_MOTOR_FORWARD: u32 = 1;
pub const LEDC_CH_MOTOR_BACKWARD: u32 = 2;
pub const LEDC_TIMER_MOTOR: u32 = 1;

// ---------------------------------------------------------------------------
// Status LED (on-board)
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 2;
