//! Top-level experiment file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentConfig, AgentParams};
use crate::environment::EnvironmentConfig;
use crate::validate::ValidationResult;

/// Exploration schedule used during training phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExplorationConfig {
    /// Probability of a random action in a training cycle.
    #[serde(default)]
    pub rate: f64,

    /// Multiplier applied to `rate` after every training cycle.
    #[serde(default = "default_decay")]
    pub decay: f64,
}

fn default_decay() -> f64 {
    1.0
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            rate: 0.0,
            decay: default_decay(),
        }
    }
}

/// Experiment length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScheduleConfig {
    /// Base number of cycles; training phases last a fifth of the scaled
    /// total, evaluation phases a tenth.
    #[serde(default = "default_total_cycles")]
    pub total_cycles: u64,

    /// Scale factor for `total_cycles`.
    #[serde(default = "default_total_cycles_mult")]
    pub total_cycles_mult: u64,

    /// Stop an episode once the agent's lifetime exceeds this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminate_lifetime: Option<u64>,
}

fn default_total_cycles() -> u64 {
    1000
}

fn default_total_cycles_mult() -> u64 {
    1
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            total_cycles: default_total_cycles(),
            total_cycles_mult: default_total_cycles_mult(),
            terminate_lifetime: None,
        }
    }
}

impl ScheduleConfig {
    /// `total_cycles * total_cycles_mult`, saturating.
    pub fn scaled_total(&self) -> u64 {
        self.total_cycles.saturating_mul(self.total_cycles_mult)
    }

    /// Length of one training phase.
    pub fn training_phase_len(&self) -> u64 {
        self.scaled_total() / 5
    }

    /// Length of one evaluation phase.
    pub fn evaluation_phase_len(&self) -> u64 {
        self.scaled_total() / 10
    }

    /// Global cycles a full run of one game lasts.
    pub fn run_length(&self) -> u64 {
        self.scaled_total().saturating_mul(2)
    }
}

/// A complete experiment description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExperimentConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Free-form label copied into telemetry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub exploration: ExplorationConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// RNG seed for agent and environment; fresh entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: None,
            environment: EnvironmentConfig::default(),
            agent: AgentConfig::default(),
            exploration: ExplorationConfig::default(),
            schedule: ScheduleConfig::default(),
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Agent parameters with widths filled in from the environment.
    pub fn agent_params(&self) -> ValidationResult<AgentParams> {
        self.agent.resolve(&self.environment.interface())
    }

    /// Label for logs: the explicit name or the environment name.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.environment.name())
    }
}
