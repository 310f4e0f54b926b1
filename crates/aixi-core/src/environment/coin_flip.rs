//! Predict a biased coin.
//!
//! The coin shows heads (1) with probability `p`, independent of the agent.
//! The action is a guess of the next toss; a correct guess earns reward 1.

use aixi_common::{Action, Observation, Result, Reward};
use aixi_config::EnvironmentInterface;
use rand::rngs::StdRng;
use rand::Rng;

use super::{check_action, check_probability, make_rng, Environment};

pub struct CoinFlip {
    p: f64,
    observation: Observation,
    reward: Reward,
    rng: StdRng,
}

impl CoinFlip {
    pub fn new(p: f64, seed: Option<u64>) -> Result<Self> {
        check_probability("coin flip p", p)?;
        let mut env = Self {
            p,
            observation: 0,
            reward: 0,
            rng: make_rng(seed),
        };
        env.reset();
        Ok(env)
    }

    fn toss(&mut self) -> Observation {
        u64::from(self.rng.random::<f64>() < self.p)
    }
}

impl Environment for CoinFlip {
    fn name(&self) -> &'static str {
        "coin-flip"
    }

    fn interface(&self) -> EnvironmentInterface {
        EnvironmentInterface {
            actions: 2,
            observation_bits: 1,
            reward_bits: 1,
        }
    }

    fn observation(&self) -> Observation {
        self.observation
    }

    fn reward(&self) -> Reward {
        self.reward
    }

    fn perform_action(&mut self, action: Action) -> Result<()> {
        check_action(action, 2)?;
        self.observation = self.toss();
        self.reward = u64::from(action == self.observation);
        Ok(())
    }

    fn reset(&mut self) {
        self.observation = self.toss();
        self.reward = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certain_coin_rewards_correct_guess() {
        let mut env = CoinFlip::new(1.0, Some(0)).unwrap();
        assert_eq!(env.observation(), 1);
        env.perform_action(1).unwrap();
        assert_eq!(env.reward(), 1);
        env.perform_action(0).unwrap();
        assert_eq!(env.reward(), 0);
        assert!(!env.is_finished());
    }

    #[test]
    fn test_bias_is_respected() {
        let mut env = CoinFlip::new(0.7, Some(42)).unwrap();
        let heads: u64 = (0..2000)
            .map(|_| {
                env.perform_action(1).unwrap();
                env.observation()
            })
            .sum();
        assert!((1250..1550).contains(&heads), "heads = {heads}");
    }
}
