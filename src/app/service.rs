//! Command service: the remote-control protocol.
//!
//! [`CommandService`] turns one inbound text payload into a change of the
//! shared [`ControlState`] and/or a snapshot broadcast.  It never touches
//! the motor: the drive loop picks up new limits and the emergency flag on
//! its next tick.
//!
//! ```text
//!  CommandChannel ──▶ ┌──────────────────┐ ──▶ BroadcastPort (reply)
//!                     │  CommandService  │
//!   StoragePort  ◀────│  parse · apply   │ ──▶ ControlState
//!                     └──────────────────┘
//! ```

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{KEY_MAX_BACKWARD, KEY_MAX_FORWARD};
use crate::error::CommandError;

use super::commands::Command;
use super::events::{ThrottleSnapshot, to_payload};
use super::ports::{BroadcastPort, CommandConsumer, StoragePort};
use super::state::ControlState;

pub struct CommandService<S: StoragePort> {
    state: Arc<ControlState>,
    storage: S,
}

impl<S: StoragePort> CommandService<S> {
    pub fn new(state: Arc<ControlState>, storage: S) -> Self {
        Self { state, storage }
    }

    pub fn state(&self) -> &Arc<ControlState> {
        &self.state
    }

    /// Parse and apply one inbound message.
    ///
    /// Returns the decoded command on success.  Invalid input is rejected
    /// before anything is touched.  A persistence failure on `update_max`
    /// is reported only after the new limits are live and the snapshot has
    /// been broadcast.
    pub fn handle_message(
        &self,
        payload: &str,
        out: &dyn BroadcastPort,
    ) -> Result<Command, CommandError> {
        let command = Command::parse(payload).inspect_err(|e| {
            debug!("CommandService: dropping message ({}): {:.64}", e, payload);
        })?;

        match command {
            Command::UpdateMax { forward, backward } => {
                self.state.set_limits(forward, backward);
                info!(
                    "CommandService: limits forward={:.1}% backward={:.1}%",
                    forward, backward
                );
                let persisted = self.persist_limits(forward, backward);
                self.broadcast_state(out);
                persisted?;
            }
            Command::Read => self.broadcast_state(out),
            Command::ReadThrottle => {
                let snapshot = ThrottleSnapshot {
                    current_throttle: f32::from(self.state.forward_throttle()) / 100.0,
                };
                out.broadcast(&to_payload(&snapshot));
            }
            Command::EmergencyStop { enabled } => {
                self.state.set_emergency_stop(enabled);
                if enabled {
                    warn!("CommandService: EMERGENCY STOP engaged");
                } else {
                    info!("CommandService: emergency stop released");
                }
                self.broadcast_state(out);
            }
            Command::Unknown => debug!("CommandService: ignoring unknown command"),
        }

        Ok(command)
    }

    /// Write both limits, attempting the second even if the first fails.
    fn persist_limits(&self, forward: f32, backward: f32) -> Result<(), CommandError> {
        let fwd = self.storage.set_float(KEY_MAX_FORWARD, forward);
        let bwd = self.storage.set_float(KEY_MAX_BACKWARD, backward);
        for (key, result) in [(KEY_MAX_FORWARD, fwd), (KEY_MAX_BACKWARD, bwd)] {
            if let Err(e) = result {
                warn!("CommandService: persisting {} failed: {}", key, e);
            }
        }
        fwd.and(bwd).map_err(CommandError::from)
    }

    fn broadcast_state(&self, out: &dyn BroadcastPort) {
        out.broadcast(&to_payload(&self.state.snapshot()));
    }
}

impl<S: StoragePort + Send + Sync> CommandConsumer for CommandService<S> {
    fn on_message(&self, payload: &str, reply: &dyn BroadcastPort) -> Result<(), CommandError> {
        self.handle_message(payload, reply).map(|_| ())
    }
}
