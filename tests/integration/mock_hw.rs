//! Mock adapters for integration tests.
//!
//! Records every motor write and every transport send so tests can assert
//! on the full output history without a PWM peripheral or a socket.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use powerwheel::app::ports::{MotorChannel, MotorPort, StorageError, StoragePort, ThrottlePort};
use powerwheel::error::ActuatorError;
use powerwheel::rpc::transport::ListenerTransport;

// ── Motor call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCall {
    SetDuty { channel: MotorChannel, duty: u16 },
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

/// Pedals and motor driver in one, like `DriveHardware`.
pub struct MockHardware {
    pub forward: u8,
    pub backward: u8,
    pub max_duty: u16,
    pub fail_motor: bool,
    pub calls: Vec<MotorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            forward: 0,
            backward: 0,
            max_duty: 1023,
            fail_motor: false,
            calls: Vec::new(),
        }
    }

    pub fn press(&mut self, forward: bool, backward: bool) {
        self.forward = if forward { 100 } else { 0 };
        self.backward = if backward { 100 } else { 0 };
    }

    /// Last duty written to `channel`, `0` after an `AllOff`.
    pub fn duty(&self, channel: MotorChannel) -> u16 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match *c {
                MotorCall::SetDuty { channel: ch, duty } if ch == channel => Some(duty),
                MotorCall::AllOff => Some(0),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn duties(&self) -> impl Iterator<Item = u16> + '_ {
        self.calls.iter().filter_map(|c| match *c {
            MotorCall::SetDuty { duty, .. } => Some(duty),
            MotorCall::AllOff => None,
        })
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ThrottlePort for MockHardware {
    fn forward_intensity(&mut self) -> u8 {
        self.forward
    }

    fn backward_intensity(&mut self) -> u8 {
        self.backward
    }
}

impl MotorPort for MockHardware {
    fn max_duty(&self) -> u16 {
        self.max_duty
    }

    fn set_duty(&mut self, channel: MotorChannel, duty: u16) -> Result<(), ActuatorError> {
        if self.fail_motor {
            return Err(match channel {
                MotorChannel::Forward => ActuatorError::ForwardPwmFailed,
                MotorChannel::Backward => ActuatorError::BackwardPwmFailed,
            });
        }
        self.calls.push(MotorCall::SetDuty { channel, duty });
        Ok(())
    }

    fn all_off(&mut self) {
        self.calls.push(MotorCall::AllOff);
    }
}

// ── MockStore ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStore {
    pub values: Mutex<HashMap<String, f32>>,
    pub fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn value(&self, key: &str) -> Option<f32> {
        self.values.lock().unwrap().get(key).copied()
    }

    pub fn fail(&self, on: bool) {
        self.fail_writes.store(on, Ordering::Relaxed);
    }
}

impl StoragePort for MockStore {
    fn get_float(&self, key: &str, default: f32) -> f32 {
        self.value(key).unwrap_or(default)
    }

    fn set_float(&self, key: &str, value: f32) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StorageError::IoError);
        }
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

// ── RecordingTransport ────────────────────────────────────────

/// Listener transport that records sends per handle.  Handles listed in
/// `broken` fail every send.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(u32, String)>>,
    pub closed: Mutex<Vec<u32>>,
    pub broken: Mutex<HashSet<u32>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn break_handle(&self, handle: u32) {
        self.broken.lock().unwrap().insert(handle);
    }

    pub fn received_by(&self, handle: u32) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn was_closed(&self, handle: u32) -> bool {
        self.closed.lock().unwrap().contains(&handle)
    }
}

impl ListenerTransport for RecordingTransport {
    type Handle = u32;
    type Error = &'static str;

    fn send_text(&self, handle: u32, payload: &str) -> Result<(), &'static str> {
        if self.broken.lock().unwrap().contains(&handle) {
            return Err("peer gone");
        }
        self.sent.lock().unwrap().push((handle, payload.to_string()));
        Ok(())
    }

    fn close(&self, handle: u32) {
        self.closed.lock().unwrap().push(handle);
    }
}
