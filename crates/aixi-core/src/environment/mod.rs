//! Reference environments.
//!
//! Every environment speaks the agent's protocol: it exposes the current
//! percept, accepts one action per cycle, and may report that an episode is
//! finished. Rewards are shifted so they are never negative and fit the
//! configured reward width.

pub mod cheese_maze;
pub mod coin_flip;
pub mod extended_tiger;
pub mod rock_paper_scissors;
pub mod tictactoe;

pub use cheese_maze::CheeseMaze;
pub use coin_flip::CoinFlip;
pub use extended_tiger::ExtendedTiger;
pub use rock_paper_scissors::BiasedRockPaperScissors;
pub use tictactoe::TicTacToe;

use aixi_common::{Action, Error, Observation, Percept, Result, Reward};
use aixi_config::{EnvironmentConfig, EnvironmentInterface};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// An environment the agent interacts with.
pub trait Environment: Send {
    /// Stable kebab-case name.
    fn name(&self) -> &'static str;

    /// Action count and percept widths.
    fn interface(&self) -> EnvironmentInterface;

    fn observation(&self) -> Observation;

    fn reward(&self) -> Reward;

    /// Advance one cycle.
    fn perform_action(&mut self, action: Action) -> Result<()>;

    /// Whether the current episode is over.
    fn is_finished(&self) -> bool {
        false
    }

    /// Start a new episode.
    fn reset(&mut self);

    fn percept(&self) -> Percept {
        Percept::new(self.observation(), self.reward())
    }

    fn num_actions(&self) -> u64 {
        self.interface().actions
    }

    fn observation_bits(&self) -> u32 {
        self.interface().observation_bits
    }

    fn reward_bits(&self) -> u32 {
        self.interface().reward_bits
    }
}

/// Build the environment described by `config`.
pub fn build_environment(
    config: &EnvironmentConfig,
    seed: Option<u64>,
) -> Result<Box<dyn Environment>> {
    let env: Box<dyn Environment> = match config {
        EnvironmentConfig::CoinFlip { p } => Box::new(CoinFlip::new(*p, seed)?),
        EnvironmentConfig::CheeseMaze { layout, start } => {
            Box::new(CheeseMaze::new(layout, *start, seed)?)
        }
        EnvironmentConfig::ExtendedTiger { listen_accuracy } => {
            Box::new(ExtendedTiger::new(*listen_accuracy, seed)?)
        }
        EnvironmentConfig::Tictactoe => Box::new(TicTacToe::new(seed)),
        EnvironmentConfig::BiasedRockPaperScissors => {
            Box::new(BiasedRockPaperScissors::new(seed))
        }
    };
    Ok(env)
}

/// Seeded generator, or one seeded from the OS.
pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

pub(crate) fn check_action(action: Action, num_actions: u64) -> Result<()> {
    if action >= num_actions {
        return Err(Error::InvalidAction {
            action,
            num_actions,
        });
    }
    Ok(())
}

pub(crate) fn check_probability(name: &str, p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::Environment(format!(
            "{name} must be a probability, got {p}"
        )));
    }
    Ok(())
}
