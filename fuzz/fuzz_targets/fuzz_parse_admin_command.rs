//! Fuzz target: admin command-line parser.
//!
//! Admin verbs arrive as free-form chat text; the parser must return a
//! structured command or a structured error, never panic.
#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        match quorum_service::AdminCommand::parse(text) {
            Ok(cmd) => {
                let _ = format!("{cmd:?}");
            }
            Err(e) => {
                let _ = e.to_string();
            }
        }
    }
});
