//! Periodic activity runner.
//!
//! Each repeating unit of work (drive loop, command dispatch, indicator,
//! telemetry) gets its own thread with its own priority.  The activity decides its next delay
//! on every run, which is how the drive loop slows to its emergency idle
//! interval and the indicator follows the current blink cadence.
//!
//! ```text
//! ┌──────────────┐ ┌───────────────┐ ┌───────────────┐ ┌───────────────┐
//! │ drive   P=20 │ │ commands P=12 │ │ indicator P=10│ │ telemetry P=5 │
//! │ core 1       │ │ core 0        │ │ core 0        │ │ core 0        │
//! └──────┬───────┘ └───────┬───────┘ └───────┬───────┘ └───────┬───────┘
//!        │  step() → Continue(delay) → sleep(delay) → step() …  │
//!        ▼                 ▼                 ▼                 ▼
//!                   Arc<ControlState> (atomics only)
//! ```

use std::io;
use std::ops::ControlFlow;
use std::thread::JoinHandle;
use std::time::Duration;

use log::info;

use crate::drivers::task_pin::{Core, Priority, spawn_on_core};

// ═══════════════════════════════════════════════════════════════
//  Activity descriptor
// ═══════════════════════════════════════════════════════════════

/// Where and how a periodic activity runs.
#[derive(Debug, Clone, Copy)]
pub struct Periodic {
    /// Null-terminated task name (e.g. `"drive\0"`).
    pub name: &'static str,
    pub core: Core,
    pub priority: Priority,
    pub stack_kb: usize,
}

impl Periodic {
    pub const DRIVE: Self = Self {
        name: "drive\0",
        core: Core::App,
        priority: Priority::DRIVE,
        stack_kb: 8,
    };

    pub const COMMANDS: Self = Self {
        name: "commands\0",
        core: Core::Pro,
        priority: Priority::COMMANDS,
        stack_kb: 6,
    };

    pub const INDICATOR: Self = Self {
        name: "indicator\0",
        core: Core::Pro,
        priority: Priority::INDICATOR,
        stack_kb: 4,
    };

    pub const TELEMETRY: Self = Self {
        name: "telemetry\0",
        core: Core::Pro,
        priority: Priority::TELEMETRY,
        stack_kb: 6,
    };
}

// ═══════════════════════════════════════════════════════════════
//  Runner
// ═══════════════════════════════════════════════════════════════

/// Run `step` forever on its own thread, sleeping for whatever delay each
/// run returns.  `ControlFlow::Break` ends the activity.
pub fn spawn_periodic<F>(task: Periodic, mut step: F) -> io::Result<JoinHandle<()>>
where
    F: FnMut() -> ControlFlow<(), Duration> + Send + 'static,
{
    spawn_on_core(task.core, task.priority, task.stack_kb, task.name, move || {
        let name = task.name.trim_end_matches('\0');
        let mut runs: u64 = 0;
        while let ControlFlow::Continue(delay) = step() {
            runs += 1;
            std::thread::sleep(delay);
        }
        info!("{}: stopped after {} runs", name, runs);
    })
}
