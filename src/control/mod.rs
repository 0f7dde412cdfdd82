//! Periodic control activities.
//!
//! - [`drive`]: pedal sampling, speed ramp and motor output (20 ms)
//! - [`indicator`]: status LED cadence
//! - [`telemetry`]: speed-change broadcasts (250 ms)
//!
//! The three share nothing but an `Arc<ControlState>`; none of them waits
//! on another.

pub mod drive;
pub mod indicator;
pub mod ramp;
pub mod telemetry;
