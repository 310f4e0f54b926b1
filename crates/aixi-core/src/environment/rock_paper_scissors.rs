//! Rock-paper-scissors against a slightly predictable opponent.
//!
//! The opponent plays uniformly at random, except that after winning a round
//! with rock it plays rock again. The observation is the opponent's move.

use aixi_common::{Action, Observation, Result, Reward};
use aixi_config::EnvironmentInterface;
use rand::rngs::StdRng;
use rand::Rng;

use super::{check_action, make_rng, Environment};

pub const ROCK: u64 = 0;
pub const PAPER: u64 = 1;
pub const SCISSORS: u64 = 2;

/// Losing the round (-1).
pub const REWARD_LOSE: Reward = 0;
/// A draw (0).
pub const REWARD_DRAW: Reward = 1;
/// Winning the round (+1).
pub const REWARD_WIN: Reward = 2;

pub struct BiasedRockPaperScissors {
    opponent_won_with_rock: bool,
    observation: Observation,
    reward: Reward,
    rng: StdRng,
}

impl BiasedRockPaperScissors {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            opponent_won_with_rock: false,
            observation: ROCK,
            reward: REWARD_DRAW,
            rng: make_rng(seed),
        }
    }
}

/// Reward for playing `ours` against `theirs`. Each move beats the one
/// before it (paper beats rock, scissors beats paper, rock beats scissors).
fn outcome(ours: u64, theirs: u64) -> Reward {
    match (3 + ours - theirs) % 3 {
        0 => REWARD_DRAW,
        1 => REWARD_WIN,
        _ => REWARD_LOSE,
    }
}

impl Environment for BiasedRockPaperScissors {
    fn name(&self) -> &'static str {
        "biased-rock-paper-scissors"
    }

    fn interface(&self) -> EnvironmentInterface {
        EnvironmentInterface {
            actions: 3,
            observation_bits: 2,
            reward_bits: 2,
        }
    }

    fn observation(&self) -> Observation {
        self.observation
    }

    fn reward(&self) -> Reward {
        self.reward
    }

    fn perform_action(&mut self, action: Action) -> Result<()> {
        check_action(action, 3)?;
        let opponent = if self.opponent_won_with_rock {
            ROCK
        } else {
            self.rng.random_range(0..3)
        };
        self.reward = outcome(action, opponent);
        self.opponent_won_with_rock = opponent == ROCK && self.reward == REWARD_LOSE;
        self.observation = opponent;
        Ok(())
    }

    fn reset(&mut self) {
        self.opponent_won_with_rock = false;
        self.observation = ROCK;
        self.reward = REWARD_DRAW;
    }
}
