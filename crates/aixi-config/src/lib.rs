//! MC-AIXI experiment configuration.
//!
//! This crate provides:
//! - Typed Rust structs for experiment files (agent, environment, schedule)
//! - Config path resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Built-in presets, one per reference environment
//! - Config snapshots for run provenance

pub mod agent;
pub mod environment;
pub mod experiment;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use agent::{AgentConfig, AgentParams, RolloutPolicyKind};
pub use environment::{EnvironmentConfig, EnvironmentInterface};
pub use experiment::{ExperimentConfig, ExplorationConfig, ScheduleConfig};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{resolve_config_path, ConfigSource, ResolvedPath};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_experiment, ValidationError, ValidationResult};

/// Schema version for experiment files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
