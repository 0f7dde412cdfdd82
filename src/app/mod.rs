//! Application core: pure domain logic, zero I/O.
//!
//! Shared control state, the remote-control command protocol and the wire
//! snapshots.  All interaction with hardware and transports happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
