//! Extended tiger: a tiger hides behind one of two doors, gold behind the
//! other.
//!
//! The agent starts each game sitting. It may listen while sitting, which
//! reports the tiger's side correctly with probability `listen_accuracy`, and
//! it may only open a door after standing up. Opening a door ends the game
//! and a new one starts immediately.

use aixi_common::{Action, Observation, Result, Reward};
use aixi_config::EnvironmentInterface;
use rand::rngs::StdRng;
use rand::Rng;

use super::{check_action, check_probability, make_rng, Environment};

pub const ACTION_STAND: Action = 0;
pub const ACTION_LISTEN: Action = 1;
pub const ACTION_OPEN_LEFT: Action = 2;
pub const ACTION_OPEN_RIGHT: Action = 3;

pub const OBS_NOTHING: Observation = 0;
pub const OBS_HEARD_LEFT: Observation = 1;
pub const OBS_HEARD_RIGHT: Observation = 2;

/// Action not allowed in the current posture (-10).
pub const REWARD_INVALID: Reward = 90;
/// Standing up or listening (-1).
pub const REWARD_ACTION: Reward = 99;
/// Opening the tiger's door (-100).
pub const REWARD_TIGER: Reward = 0;
/// Opening the gold door (+30).
pub const REWARD_GOLD: Reward = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Door {
    Left,
    Right,
}

pub struct ExtendedTiger {
    listen_accuracy: f64,
    tiger: Door,
    sitting: bool,
    observation: Observation,
    reward: Reward,
    rng: StdRng,
}

impl ExtendedTiger {
    pub fn new(listen_accuracy: f64, seed: Option<u64>) -> Result<Self> {
        check_probability("listen accuracy", listen_accuracy)?;
        let mut env = Self {
            listen_accuracy,
            tiger: Door::Left,
            sitting: true,
            observation: OBS_NOTHING,
            reward: REWARD_ACTION,
            rng: make_rng(seed),
        };
        env.reset();
        Ok(env)
    }

    fn new_game(&mut self) {
        self.tiger = if self.rng.random::<bool>() {
            Door::Left
        } else {
            Door::Right
        };
        self.sitting = true;
    }

    fn open(&mut self, door: Door) -> Reward {
        if self.sitting {
            return REWARD_INVALID;
        }
        let reward = if door == self.tiger {
            REWARD_TIGER
        } else {
            REWARD_GOLD
        };
        self.new_game();
        reward
    }

    pub fn is_sitting(&self) -> bool {
        self.sitting
    }
}

impl Environment for ExtendedTiger {
    fn name(&self) -> &'static str {
        "extended-tiger"
    }

    fn interface(&self) -> EnvironmentInterface {
        EnvironmentInterface {
            actions: 4,
            observation_bits: 2,
            reward_bits: 8,
        }
    }

    fn observation(&self) -> Observation {
        self.observation
    }

    fn reward(&self) -> Reward {
        self.reward
    }

    fn perform_action(&mut self, action: Action) -> Result<()> {
        check_action(action, 4)?;
        self.observation = OBS_NOTHING;
        self.reward = match action {
            ACTION_STAND if self.sitting => {
                self.sitting = false;
                REWARD_ACTION
            }
            ACTION_LISTEN if self.sitting => {
                let correct = self.rng.random::<f64>() < self.listen_accuracy;
                let heard = match (self.tiger, correct) {
                    (Door::Left, true) | (Door::Right, false) => Door::Left,
                    (Door::Right, true) | (Door::Left, false) => Door::Right,
                };
                self.observation = match heard {
                    Door::Left => OBS_HEARD_LEFT,
                    Door::Right => OBS_HEARD_RIGHT,
                };
                REWARD_ACTION
            }
            ACTION_OPEN_LEFT => self.open(Door::Left),
            ACTION_OPEN_RIGHT => self.open(Door::Right),
            _ => REWARD_INVALID,
        };
        Ok(())
    }

    fn reset(&mut self) {
        self.new_game();
        self.observation = OBS_NOTHING;
        self.reward = REWARD_ACTION;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posture_rules() {
        let mut env = ExtendedTiger::new(1.0, Some(3)).unwrap();
        env.perform_action(ACTION_OPEN_LEFT).unwrap();
        assert_eq!(env.reward(), REWARD_INVALID);

        env.perform_action(ACTION_STAND).unwrap();
        assert_eq!(env.reward(), REWARD_ACTION);
        assert!(!env.is_sitting());

        env.perform_action(ACTION_STAND).unwrap();
        assert_eq!(env.reward(), REWARD_INVALID);
        env.perform_action(ACTION_LISTEN).unwrap();
        assert_eq!(env.reward(), REWARD_INVALID);
        assert_eq!(env.observation(), OBS_NOTHING);
    }

    #[test]
    fn test_perfect_listening_finds_gold() {
        let mut env = ExtendedTiger::new(1.0, Some(11)).unwrap();
        for _ in 0..10 {
            env.perform_action(ACTION_LISTEN).unwrap();
            let safe_door = match env.observation() {
                OBS_HEARD_LEFT => ACTION_OPEN_RIGHT,
                OBS_HEARD_RIGHT => ACTION_OPEN_LEFT,
                other => panic!("unexpected observation {other}"),
            };
            env.perform_action(ACTION_STAND).unwrap();
            env.perform_action(safe_door).unwrap();
            assert_eq!(env.reward(), REWARD_GOLD);
            assert!(env.is_sitting(), "a new game starts seated");
        }
    }

    #[test]
    fn test_always_wrong_listening_inverts_hint() {
        let mut env = ExtendedTiger::new(0.0, Some(5)).unwrap();
        env.perform_action(ACTION_LISTEN).unwrap();
        let heard_door = if env.observation() == OBS_HEARD_LEFT {
            ACTION_OPEN_LEFT
        } else {
            ACTION_OPEN_RIGHT
        };
        env.perform_action(ACTION_STAND).unwrap();
        env.perform_action(heard_door).unwrap();
        assert_eq!(env.reward(), REWARD_GOLD);
    }
}
