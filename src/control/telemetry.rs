//! Telemetry broadcaster: reports speed changes to every listener.

use std::sync::Arc;

use log::debug;

use crate::app::events::{SpeedSnapshot, to_payload};
use crate::app::ports::BroadcastPort;
use crate::app::state::ControlState;

pub struct TelemetryBroadcaster {
    state: Arc<ControlState>,
    /// Speed at the previous check.  Starts at -1 so the resting speed
    /// after boot is reported once.
    last_seen: f32,
}

impl TelemetryBroadcaster {
    pub fn new(state: Arc<ControlState>) -> Self {
        Self {
            state,
            last_seen: -1.0,
        }
    }

    /// One telemetry period.  Returns `true` if a snapshot was sent.
    ///
    /// Nothing is sent while the emergency stop is latched, but the speed
    /// is still recorded so a change is never reported twice.
    pub fn step(&mut self, out: &dyn BroadcastPort) -> bool {
        let speed = self.state.current_speed();
        let send = !self.state.emergency_stop() && speed != self.last_seen;

        if send {
            let payload = to_payload(&SpeedSnapshot {
                current_speed: speed,
            });
            debug!("telemetry: {}", payload);
            out.broadcast(&payload);
        }

        self.last_seen = speed;
        send
    }
}
