//! Built-in experiment presets, one per reference environment.
//!
//! Depths and horizons are scaled down from the published MC-AIXI runs so a
//! preset finishes on a laptop; bump `ct_depth` and the cycle count for
//! serious experiments.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::AgentConfig;
use crate::environment::{default_maze_layout, EnvironmentConfig};
use crate::experiment::{ExperimentConfig, ExplorationConfig, ScheduleConfig};

/// Available presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetName {
    CoinFlip,
    CheeseMaze,
    ExtendedTiger,
    Tictactoe,
    RockPaperScissors,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::CoinFlip,
        PresetName::CheeseMaze,
        PresetName::ExtendedTiger,
        PresetName::Tictactoe,
        PresetName::RockPaperScissors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::CoinFlip => "coin-flip",
            PresetName::CheeseMaze => "cheese-maze",
            PresetName::ExtendedTiger => "extended-tiger",
            PresetName::Tictactoe => "tictactoe",
            PresetName::RockPaperScissors => "rock-paper-scissors",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "coin-flip" | "coin" => Some(PresetName::CoinFlip),
            "cheese-maze" | "maze" => Some(PresetName::CheeseMaze),
            "extended-tiger" | "tiger" => Some(PresetName::ExtendedTiger),
            "tictactoe" | "tic-tac-toe" => Some(PresetName::Tictactoe),
            "rock-paper-scissors" | "biased-rock-paper-scissors" | "rps" => {
                Some(PresetName::RockPaperScissors)
            }
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::CoinFlip => "Predict a 70/30 biased coin; learns within a few hundred cycles",
            PresetName::CheeseMaze => "Eleven-cell maze, 4-bit wall observations, reward for the cheese",
            PresetName::ExtendedTiger => "Stand, listen and open the door without the tiger",
            PresetName::Tictactoe => "Noughts and crosses against a random opponent",
            PresetName::RockPaperScissors => "Exploit an opponent that repeats a winning rock",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone)]
pub enum PresetError {
    /// Unknown preset name.
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => {
                write!(
                    f,
                    "Unknown preset '{}'. Available: {}",
                    name,
                    PresetName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for PresetError {}

/// Summary row for `config presets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: String,
    pub environment: String,
}

/// Names and descriptions of every preset.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo {
            name,
            description: name.description().to_string(),
            environment: get_preset(name).environment.name().to_string(),
        })
        .collect()
}

/// Get the experiment for a preset.
pub fn get_preset(name: PresetName) -> ExperimentConfig {
    match name {
        PresetName::CoinFlip => coin_flip_preset(),
        PresetName::CheeseMaze => cheese_maze_preset(),
        PresetName::ExtendedTiger => extended_tiger_preset(),
        PresetName::Tictactoe => tictactoe_preset(),
        PresetName::RockPaperScissors => rock_paper_scissors_preset(),
    }
}

fn preset_base(environment: EnvironmentConfig, ct_depth: usize, horizon: u32) -> ExperimentConfig {
    ExperimentConfig {
        environment,
        agent: AgentConfig {
            ct_depth,
            horizon,
            ..Default::default()
        },
        exploration: ExplorationConfig {
            rate: 0.99,
            decay: 0.9999,
        },
        ..Default::default()
    }
}

fn coin_flip_preset() -> ExperimentConfig {
    ExperimentConfig {
        name: Some("preset:coin-flip".to_string()),
        exploration: ExplorationConfig::default(),
        ..preset_base(EnvironmentConfig::CoinFlip { p: 0.7 }, 4, 2)
    }
}

fn cheese_maze_preset() -> ExperimentConfig {
    ExperimentConfig {
        name: Some("preset:cheese-maze".to_string()),
        schedule: ScheduleConfig {
            total_cycles: 5000,
            ..Default::default()
        },
        ..preset_base(
            EnvironmentConfig::CheeseMaze {
                layout: default_maze_layout(),
                start: None,
            },
            32,
            8,
        )
    }
}

fn extended_tiger_preset() -> ExperimentConfig {
    ExperimentConfig {
        name: Some("preset:extended-tiger".to_string()),
        ..preset_base(
            EnvironmentConfig::ExtendedTiger {
                listen_accuracy: 0.85,
            },
            48,
            4,
        )
    }
}

fn tictactoe_preset() -> ExperimentConfig {
    ExperimentConfig {
        name: Some("preset:tictactoe".to_string()),
        ..preset_base(EnvironmentConfig::Tictactoe, 64, 9)
    }
}

fn rock_paper_scissors_preset() -> ExperimentConfig {
    ExperimentConfig {
        name: Some("preset:rock-paper-scissors".to_string()),
        ..preset_base(EnvironmentConfig::BiasedRockPaperScissors, 32, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_experiment;

    #[test]
    fn every_preset_validates() {
        for &name in PresetName::ALL {
            let preset = get_preset(name);
            assert!(
                validate_experiment(&preset).is_ok(),
                "preset {} failed validation",
                name
            );
        }
    }

    #[test]
    fn parse_aliases() {
        assert_eq!(PresetName::parse("maze"), Some(PresetName::CheeseMaze));
        assert_eq!(PresetName::parse("RPS"), Some(PresetName::RockPaperScissors));
        assert_eq!(PresetName::parse("coin_flip"), Some(PresetName::CoinFlip));
        assert_eq!(PresetName::parse("pacman"), None);
    }

    #[test]
    fn unknown_preset_lists_available() {
        let err = "pacman".parse::<PresetName>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("pacman"));
        assert!(msg.contains("extended-tiger"));
    }

    #[test]
    fn list_covers_all() {
        let list = list_presets();
        assert_eq!(list.len(), PresetName::ALL.len());
        assert_eq!(list[0].environment, "coin-flip");
    }
}
