//! Fuzz target for JSON experiment parsing.

#![no_main]

use aixi_config::{validate_experiment, ExperimentConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Should never panic, only return an error
    if let Ok(experiment) = serde_json::from_slice::<ExperimentConfig>(data) {
        let _ = validate_experiment(&experiment);
    }
});
