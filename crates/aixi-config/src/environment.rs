//! Environment section of an experiment file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Widths an environment needs from the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnvironmentInterface {
    pub actions: u64,
    pub observation_bits: u32,
    pub reward_bits: u32,
}

/// Which reference environment to run, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvironmentConfig {
    /// Predict a biased coin; reward 1 for a correct guess.
    CoinFlip {
        /// Probability of heads.
        #[serde(default = "default_coin_p")]
        p: f64,
    },

    /// Find the cheese in a small grid maze while observing adjacent walls.
    CheeseMaze {
        /// Rows of the maze: `#` wall, `.` free, `C` cheese.
        #[serde(default = "default_maze_layout")]
        layout: Vec<String>,
        /// Starting `[row, column]`; a random free cell when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<[usize; 2]>,
    },

    /// Tiger behind one of two doors; the agent must stand before opening.
    ExtendedTiger {
        /// Probability that listening reports the true tiger position.
        #[serde(default = "default_listen_accuracy")]
        listen_accuracy: f64,
    },

    /// Noughts and crosses against a uniformly random opponent.
    Tictactoe,

    /// Rock-paper-scissors against an opponent that repeats a winning rock.
    BiasedRockPaperScissors,
}

fn default_coin_p() -> f64 {
    0.7
}

fn default_listen_accuracy() -> f64 {
    0.85
}

/// The classic eleven-cell cheese maze.
pub fn default_maze_layout() -> Vec<String> {
    ["#######", "#.....#", "#.#.#.#", "#.#C#.#", "#######"]
        .iter()
        .map(|row| row.to_string())
        .collect()
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig::CoinFlip {
            p: default_coin_p(),
        }
    }
}

impl EnvironmentConfig {
    /// Stable kebab-case name used in logs and telemetry.
    pub fn name(&self) -> &'static str {
        match self {
            EnvironmentConfig::CoinFlip { .. } => "coin-flip",
            EnvironmentConfig::CheeseMaze { .. } => "cheese-maze",
            EnvironmentConfig::ExtendedTiger { .. } => "extended-tiger",
            EnvironmentConfig::Tictactoe => "tictactoe",
            EnvironmentConfig::BiasedRockPaperScissors => "biased-rock-paper-scissors",
        }
    }

    /// Action count and percept widths this environment uses.
    pub fn interface(&self) -> EnvironmentInterface {
        let (actions, observation_bits, reward_bits) = match self {
            EnvironmentConfig::CoinFlip { .. } => (2, 1, 1),
            EnvironmentConfig::CheeseMaze { .. } => (4, 4, 5),
            EnvironmentConfig::ExtendedTiger { .. } => (4, 2, 8),
            EnvironmentConfig::Tictactoe => (9, 18, 3),
            EnvironmentConfig::BiasedRockPaperScissors => (3, 2, 2),
        };
        EnvironmentInterface {
            actions,
            observation_bits,
            reward_bits,
        }
    }
}
