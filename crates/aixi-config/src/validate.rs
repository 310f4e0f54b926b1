//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::agent::AgentConfig;
use crate::environment::EnvironmentConfig;
use crate::experiment::{ExperimentConfig, ExplorationConfig, ScheduleConfig};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest context depth accepted; deeper trees only cost memory.
pub const MAX_CT_DEPTH: usize = 256;

/// Largest observation or reward width accepted.
pub const MAX_PERCEPT_BITS: u32 = 32;

/// Longest search budget accepted, in seconds.
pub const MAX_SEARCH_TIMEOUT_SECS: f64 = 3600.0;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

/// Validate a whole experiment file semantically.
pub fn validate_experiment(config: &ExperimentConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_environment(&config.environment)?;
    validate_agent(&config.agent)?;
    validate_exploration(&config.exploration)?;
    validate_schedule(&config.schedule)?;

    // Explicit widths must be compatible with the environment.
    config.agent_params()?;

    Ok(())
}

fn validate_probability(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("Must be in [0, 1], got {}", value)));
    }
    Ok(())
}

/// Validate environment parameters.
pub fn validate_environment(env: &EnvironmentConfig) -> ValidationResult<()> {
    match env {
        EnvironmentConfig::CoinFlip { p } => validate_probability("environment.p", *p),
        EnvironmentConfig::ExtendedTiger { listen_accuracy } => {
            validate_probability("environment.listen_accuracy", *listen_accuracy)
        }
        EnvironmentConfig::CheeseMaze { layout, start } => validate_maze(layout, *start),
        EnvironmentConfig::Tictactoe | EnvironmentConfig::BiasedRockPaperScissors => Ok(()),
    }
}

fn validate_maze(layout: &[String], start: Option<[usize; 2]>) -> ValidationResult<()> {
    let width = match layout.first() {
        Some(row) if !row.is_empty() => row.chars().count(),
        _ => {
            return Err(invalid(
                "environment.layout",
                "Maze must have at least one non-empty row".to_string(),
            ))
        }
    };

    let mut cheese = 0usize;
    let mut free = 0usize;
    for (r, row) in layout.iter().enumerate() {
        if row.chars().count() != width {
            return Err(invalid(
                "environment.layout",
                format!("Row {} has {} cells, expected {}", r, row.chars().count(), width),
            ));
        }
        for (c, cell) in row.chars().enumerate() {
            match cell {
                '#' => {}
                '.' => free += 1,
                'C' => cheese += 1,
                other => {
                    return Err(invalid(
                        "environment.layout",
                        format!("Unknown cell '{}' at row {}, column {}", other, r, c),
                    ))
                }
            }
        }
    }

    if cheese != 1 {
        return Err(invalid(
            "environment.layout",
            format!("Maze must contain exactly one cheese cell, found {}", cheese),
        ));
    }
    if free == 0 {
        return Err(invalid(
            "environment.layout",
            "Maze needs at least one free cell besides the cheese".to_string(),
        ));
    }

    if let Some([row, col]) = start {
        let cell = layout.get(row).and_then(|r| r.chars().nth(col));
        if cell != Some('.') {
            return Err(invalid(
                "environment.start",
                format!("[{}, {}] is not a free cell", row, col),
            ));
        }
    }

    Ok(())
}

/// Validate agent and planner parameters.
pub fn validate_agent(agent: &AgentConfig) -> ValidationResult<()> {
    if let Some(actions) = agent.actions {
        if actions < 2 {
            return Err(invalid(
                "agent.actions",
                format!("Need at least 2 actions, got {}", actions),
            ));
        }
    }
    for (field, bits) in [
        ("agent.observation_bits", agent.observation_bits),
        ("agent.reward_bits", agent.reward_bits),
    ] {
        if let Some(bits) = bits {
            if bits == 0 || bits > MAX_PERCEPT_BITS {
                return Err(invalid(
                    field,
                    format!("Must be in 1..={}, got {}", MAX_PERCEPT_BITS, bits),
                ));
            }
        }
    }
    if agent.horizon == 0 {
        return Err(invalid("agent.horizon", "Must be positive".to_string()));
    }
    if agent.ct_depth == 0 || agent.ct_depth > MAX_CT_DEPTH {
        return Err(invalid(
            "agent.ct_depth",
            format!("Must be in 1..={}, got {}", MAX_CT_DEPTH, agent.ct_depth),
        ));
    }
    if !agent.exploration_weight.is_finite() || agent.exploration_weight < 0.0 {
        return Err(invalid(
            "agent.exploration_weight",
            format!("Must be finite and non-negative, got {}", agent.exploration_weight),
        ));
    }
    if !(0.0..=MAX_SEARCH_TIMEOUT_SECS).contains(&agent.search_timeout_secs) {
        return Err(invalid(
            "agent.search_timeout_secs",
            format!(
                "Must be in [0, {}], got {}",
                MAX_SEARCH_TIMEOUT_SECS, agent.search_timeout_secs
            ),
        ));
    }
    if agent.max_percept_branches == 0 {
        return Err(invalid(
            "agent.max_percept_branches",
            "Must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Validate the exploration schedule.
pub fn validate_exploration(exploration: &ExplorationConfig) -> ValidationResult<()> {
    validate_probability("exploration.rate", exploration.rate)?;
    validate_probability("exploration.decay", exploration.decay)
}

/// Validate experiment length settings.
pub fn validate_schedule(schedule: &ScheduleConfig) -> ValidationResult<()> {
    if schedule.total_cycles == 0 {
        return Err(invalid(
            "schedule.total_cycles",
            "Must be positive".to_string(),
        ));
    }
    if schedule.total_cycles_mult == 0 {
        return Err(invalid(
            "schedule.total_cycles_mult",
            "Must be positive".to_string(),
        ));
    }
    if schedule.evaluation_phase_len() == 0 {
        return Err(ValidationError::SemanticError(format!(
            "total_cycles * total_cycles_mult = {} is too short for training and evaluation phases (need at least 10)",
            schedule.scaled_total()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::default_maze_layout;

    #[test]
    fn default_experiment_is_valid() {
        assert!(validate_experiment(&ExperimentConfig::default()).is_ok());
    }

    #[test]
    fn version_mismatch_detected() {
        let config = ExperimentConfig {
            schema_version: "0.9.0".to_string(),
            ..Default::default()
        };
        let err = validate_experiment(&config).unwrap_err();
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn coin_probability_range() {
        let err = validate_environment(&EnvironmentConfig::CoinFlip { p: 1.5 }).unwrap_err();
        assert!(err.to_string().contains("environment.p"));
    }

    #[test]
    fn maze_needs_one_cheese() {
        let layout = vec!["###".to_string(), "#.#".to_string(), "###".to_string()];
        let err = validate_maze(&layout, None).unwrap_err();
        assert!(err.to_string().contains("exactly one cheese"));
    }

    #[test]
    fn maze_rejects_ragged_rows() {
        let layout = vec!["####".to_string(), "#.C".to_string()];
        assert!(validate_maze(&layout, None).is_err());
    }

    #[test]
    fn maze_start_must_be_free() {
        assert!(validate_maze(&default_maze_layout(), Some([1, 1])).is_ok());
        assert!(validate_maze(&default_maze_layout(), Some([0, 0])).is_err());
        // The cheese cell is not a valid start.
        assert!(validate_maze(&default_maze_layout(), Some([3, 3])).is_err());
    }

    #[test]
    fn agent_limits() {
        let bad_depth = AgentConfig {
            ct_depth: 0,
            ..Default::default()
        };
        assert!(validate_agent(&bad_depth).is_err());

        let bad_weight = AgentConfig {
            exploration_weight: f64::NAN,
            ..Default::default()
        };
        assert!(validate_agent(&bad_weight).is_err());

        let bad_branches = AgentConfig {
            max_percept_branches: 0,
            ..Default::default()
        };
        assert!(validate_agent(&bad_branches).is_err());

        let zero_timeout = AgentConfig {
            search_timeout_secs: 0.0,
            ..Default::default()
        };
        assert!(validate_agent(&zero_timeout).is_ok());
    }

    #[test]
    fn short_schedule_rejected() {
        let schedule = ScheduleConfig {
            total_cycles: 5,
            ..Default::default()
        };
        let err = validate_schedule(&schedule).unwrap_err();
        assert_eq!(err.code(), 63);
    }

    #[test]
    fn exploration_rate_range() {
        let exploration = ExplorationConfig {
            rate: -0.1,
            decay: 1.0,
        };
        assert!(validate_exploration(&exploration).is_err());
    }
}
