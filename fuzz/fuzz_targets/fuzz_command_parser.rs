//! Fuzz target: `Command::parse`
//!
//! Feeds arbitrary bytes into the command decoder as if they had arrived
//! in a websocket text frame, and checks that anything accepted as
//! `update_max` carries limits the drive loop can use.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use powerwheel::app::commands::{Command, LIMIT_RANGE};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(Command::UpdateMax { forward, backward }) = Command::parse(text) {
        assert!(LIMIT_RANGE.contains(&forward), "forward limit {} accepted", forward);
        assert!(LIMIT_RANGE.contains(&backward), "backward limit {} accepted", backward);
    }
});
