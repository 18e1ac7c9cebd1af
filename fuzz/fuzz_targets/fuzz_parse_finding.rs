//! Fuzz target: finding-text parser.
//!
//! Auditor replies arrive as arbitrary chat text; the parser must either
//! map them onto the fixed yes/no vocabularies or reject them, never panic.
#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        match quorum_core::finding::parse(text) {
            Ok(_) => {
                // Anything accepted must normalise into one of the vocabularies.
                let normalised = text.trim().to_lowercase();
                assert!(
                    quorum_core::finding::TRUE_ANSWERS.contains(&normalised.as_str())
                        || quorum_core::finding::FALSE_ANSWERS.contains(&normalised.as_str())
                );
            }
            Err(e) => {
                let _ = e.to_string();
            }
        }
    }
});
