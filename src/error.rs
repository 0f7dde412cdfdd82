//! Unified error types for the drive controller firmware.
//!
//! Every subsystem error is a small `Copy` enum with a `Display` impl and a
//! `From` conversion into the top-level [`Error`], so the bootstrap code and
//! the periodic tasks can handle failures uniformly.

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A motor or indicator output could not be driven.
    Actuator(ActuatorError),
    /// The listener or consumer table refused a registration.
    Channel(ChannelError),
    /// An inbound command was rejected or only partially applied.
    Command(CommandError),
    /// The persistence service failed.
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Channel(e) => write!(f, "channel: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

/// Hardware output failures. A motor failure is fatal for the drive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write on the forward channel failed.
    ForwardPwmFailed,
    /// PWM duty-cycle write on the backward channel failed.
    BackwardPwmFailed,
    /// GPIO level write failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForwardPwmFailed => write!(f, "forward PWM write failed"),
            Self::BackwardPwmFailed => write!(f, "backward PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Channel errors
// ---------------------------------------------------------------------------

/// Registration refusals from the Command Channel tables.
///
/// A duplicate handle and a full table are reported identically: the caller
/// only needs to know the listener was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// Listener handle already registered, or no free listener slot.
    ListenerRejected,
    /// Consumer already registered, or no free consumer slot.
    ConsumerRejected,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListenerRejected => write!(f, "listener rejected (duplicate or table full)"),
            Self::ConsumerRejected => write!(f, "consumer rejected (duplicate or table full)"),
        }
    }
}

impl std::error::Error for ChannelError {}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Payload is not a JSON object with a string `command` field.
    Malformed,
    /// `parameters` missing where the command requires it.
    MissingParameters,
    /// A parameter has the wrong type or is out of range.
    InvalidParameter(&'static str),
    /// The in-memory change was applied but could not be persisted.
    Storage(StorageError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed message"),
            Self::MissingParameters => write!(f, "missing parameters"),
            Self::InvalidParameter(field) => write!(f, "invalid parameter: {field}"),
            Self::Storage(e) => write!(f, "persist failed: {e}"),
        }
    }
}

impl From<StorageError> for CommandError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl std::error::Error for CommandError {}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}
