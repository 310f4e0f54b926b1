//! Structured event vocabulary.
//!
//! Every event carries a stable name from [`event_names`], the run id and the
//! experiment stage so JSONL logs can be filtered without parsing messages.

use serde::{Deserialize, Serialize};

/// Stages of an experiment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration loading.
    Init,
    /// Collecting history before the model is consulted.
    Prime,
    /// Training phase (exploration allowed).
    Train,
    /// Evaluation phase (greedy).
    Evaluate,
    /// Tree search.
    Plan,
    /// Summary output.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Prime => "prime",
            Stage::Train => "train",
            Stage::Evaluate => "evaluate",
            Stage::Plan => "plan",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const GAME_STARTED: &str = "game.started";

    // Episodes and phases
    pub const EPISODE_FINISHED: &str = "episode.finished";
    pub const PHASE_SWITCHED: &str = "phase.switched";
    pub const CYCLE_COMPLETED: &str = "cycle.completed";
    pub const LIFETIME_TERMINATED: &str = "lifetime.terminated";

    // Planning
    pub const PLAN_FINISHED: &str = "plan.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation fields shared by every event of one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Experiment label (file name or preset).
    pub experiment: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, experiment: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            experiment: experiment.into(),
        }
    }

    /// Same run, different experiment (used between transfer games).
    pub fn with_experiment(&self, experiment: impl Into<String>) -> Self {
        LogContext {
            run_id: self.run_id.clone(),
            experiment: experiment.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Train.to_string(), "train");
        assert_eq!(Stage::Evaluate.to_string(), "evaluate");
        assert_eq!(
            serde_json::to_string(&Stage::Prime).unwrap(),
            "\"prime\""
        );
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::RUN_STARTED, "run.started");
        assert_eq!(event_names::CYCLE_COMPLETED, "cycle.completed");
        assert_eq!(event_names::PLAN_FINISHED, "plan.finished");
    }

    #[test]
    fn test_context_with_experiment() {
        let ctx = LogContext::new("run-abc", "coin-flip");
        let next = ctx.with_experiment("tictactoe");
        assert_eq!(next.run_id, "run-abc");
        assert_eq!(next.experiment, "tictactoe");
    }
}
