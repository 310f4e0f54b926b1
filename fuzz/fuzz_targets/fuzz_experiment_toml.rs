//! Fuzz target for TOML experiment parsing and validation.
//!
//! Parsing and validating arbitrary text must never panic; any accepted
//! experiment must also resolve to agent parameters and an environment.

#![no_main]

use std::path::Path;

use aixi_config::validate_experiment;
use aixi_core::build_environment;
use aixi_core::config::{parse_experiment, ConfigFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(experiment) = parse_experiment(text, ConfigFormat::Toml, Path::new("fuzz.toml")) else {
        return;
    };
    if validate_experiment(&experiment).is_ok() {
        assert!(experiment.agent_params().is_ok());
        let _ = build_environment(&experiment.environment, Some(0));
    }
});
