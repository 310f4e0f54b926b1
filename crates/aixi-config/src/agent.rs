//! Agent and planner settings.

use std::time::Duration;

use aixi_common::bits_required;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentInterface;
use crate::validate::{ValidationError, ValidationResult};

/// How actions are chosen during a playout past the search tree frontier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RolloutPolicyKind {
    /// Uniformly random legal actions.
    #[default]
    Uniform,
    /// Actions sampled in proportion to the model's own prediction of them.
    SelfModel,
}

impl std::fmt::Display for RolloutPolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RolloutPolicyKind::Uniform => write!(f, "uniform"),
            RolloutPolicyKind::SelfModel => write!(f, "self_model"),
        }
    }
}

/// Agent section of an experiment file.
///
/// `actions`, `observation_bits` and `reward_bits` may be left out; they are
/// then taken from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentConfig {
    /// Number of legal actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<u64>,

    /// Width of an encoded observation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_bits: Option<u32>,

    /// Width of an encoded reward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_bits: Option<u32>,

    /// Planning horizon in cycles.
    #[serde(default = "default_horizon")]
    pub horizon: u32,

    /// Maximum context-tree depth.
    #[serde(default = "default_ct_depth")]
    pub ct_depth: usize,

    /// UCB exploration constant.
    #[serde(default = "default_exploration_weight")]
    pub exploration_weight: f64,

    /// Wall-clock budget for one search, in seconds.
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: f64,

    /// Optional cap on rollouts per search (makes searches reproducible).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_simulations: Option<u64>,

    /// Maximum distinct percept children under one chance node.
    #[serde(default = "default_max_percept_branches")]
    pub max_percept_branches: usize,

    /// Keep the subtree for the realised (action, percept) between cycles.
    #[serde(default)]
    pub reuse_search_tree: bool,

    #[serde(default)]
    pub rollout_policy: RolloutPolicyKind,
}

fn default_horizon() -> u32 {
    16
}

fn default_ct_depth() -> usize {
    3
}

fn default_exploration_weight() -> f64 {
    1.41
}

fn default_search_timeout_secs() -> f64 {
    0.5
}

fn default_max_percept_branches() -> usize {
    100
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            actions: None,
            observation_bits: None,
            reward_bits: None,
            horizon: default_horizon(),
            ct_depth: default_ct_depth(),
            exploration_weight: default_exploration_weight(),
            search_timeout_secs: default_search_timeout_secs(),
            max_simulations: None,
            max_percept_branches: default_max_percept_branches(),
            reuse_search_tree: false,
            rollout_policy: RolloutPolicyKind::default(),
        }
    }
}

impl AgentConfig {
    /// Fill in missing widths from the environment and check explicit ones
    /// against it.
    pub fn resolve(&self, interface: &EnvironmentInterface) -> ValidationResult<AgentParams> {
        let actions = self.actions.unwrap_or(interface.actions);
        if actions != interface.actions {
            return Err(ValidationError::InvalidValue {
                field: "agent.actions".to_string(),
                message: format!(
                    "environment has {} actions, config says {}",
                    interface.actions, actions
                ),
            });
        }

        let observation_bits = self.observation_bits.unwrap_or(interface.observation_bits);
        if observation_bits < interface.observation_bits {
            return Err(ValidationError::InvalidValue {
                field: "agent.observation_bits".to_string(),
                message: format!(
                    "environment needs at least {} bits, got {}",
                    interface.observation_bits, observation_bits
                ),
            });
        }

        let reward_bits = self.reward_bits.unwrap_or(interface.reward_bits);
        if reward_bits < interface.reward_bits {
            return Err(ValidationError::InvalidValue {
                field: "agent.reward_bits".to_string(),
                message: format!(
                    "environment needs at least {} bits, got {}",
                    interface.reward_bits, reward_bits
                ),
            });
        }

        Ok(AgentParams {
            actions,
            observation_bits,
            reward_bits,
            horizon: self.horizon,
            ct_depth: self.ct_depth,
            exploration_weight: self.exploration_weight,
            search_timeout_secs: self.search_timeout_secs,
            max_simulations: self.max_simulations,
            max_percept_branches: self.max_percept_branches,
            reuse_search_tree: self.reuse_search_tree,
            rollout_policy: self.rollout_policy,
        })
    }
}

/// Fully resolved agent parameters: every width known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentParams {
    pub actions: u64,
    pub observation_bits: u32,
    pub reward_bits: u32,
    pub horizon: u32,
    pub ct_depth: usize,
    pub exploration_weight: f64,
    pub search_timeout_secs: f64,
    pub max_simulations: Option<u64>,
    pub max_percept_branches: usize,
    pub reuse_search_tree: bool,
    pub rollout_policy: RolloutPolicyKind,
}

impl AgentParams {
    /// Parameters with default planner settings for the given widths.
    pub fn with_widths(actions: u64, observation_bits: u32, reward_bits: u32) -> Self {
        let defaults = AgentConfig::default();
        Self {
            actions,
            observation_bits,
            reward_bits,
            horizon: defaults.horizon,
            ct_depth: defaults.ct_depth,
            exploration_weight: defaults.exploration_weight,
            search_timeout_secs: defaults.search_timeout_secs,
            max_simulations: None,
            max_percept_branches: defaults.max_percept_branches,
            reuse_search_tree: false,
            rollout_policy: RolloutPolicyKind::Uniform,
        }
    }

    /// Bits used to encode one action.
    pub fn action_bits(&self) -> u32 {
        bits_required(self.actions)
    }

    /// Symbols appended to the history per full cycle.
    pub fn bits_per_cycle(&self) -> u32 {
        self.observation_bits + self.reward_bits + self.action_bits()
    }

    /// Search budget; values that are not a valid duration mean no budget.
    pub fn search_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.search_timeout_secs).unwrap_or(Duration::ZERO)
    }

    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_ct_depth(mut self, depth: usize) -> Self {
        self.ct_depth = depth;
        self
    }

    pub fn with_search_timeout_secs(mut self, secs: f64) -> Self {
        self.search_timeout_secs = secs;
        self
    }

    pub fn with_max_simulations(mut self, cap: Option<u64>) -> Self {
        self.max_simulations = cap;
        self
    }

    pub fn with_max_percept_branches(mut self, cap: usize) -> Self {
        self.max_percept_branches = cap;
        self
    }

    pub fn with_rollout_policy(mut self, policy: RolloutPolicyKind) -> Self {
        self.rollout_policy = policy;
        self
    }

    pub fn with_reuse_search_tree(mut self, reuse: bool) -> Self {
        self.reuse_search_tree = reuse;
        self
    }
}
