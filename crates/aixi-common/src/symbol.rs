//! Binary symbols and the values the agent exchanges with its environment.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An action index in `0..num_actions`.
pub type Action = u64;

/// An observation, encoded in a fixed number of bits.
pub type Observation = u64;

/// A non-negative reward, encoded in a fixed number of bits.
pub type Reward = u64;

/// One binary digit of the interaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Zero,
    One,
}

impl Symbol {
    /// Index into two-slot tables (child arrays, count pairs).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Symbol::Zero => 0,
            Symbol::One => 1,
        }
    }

    #[inline]
    pub fn is_one(self) -> bool {
        self == Symbol::One
    }

    /// The other symbol.
    #[inline]
    pub fn flip(self) -> Symbol {
        match self {
            Symbol::Zero => Symbol::One,
            Symbol::One => Symbol::Zero,
        }
    }
}

impl From<bool> for Symbol {
    fn from(bit: bool) -> Self {
        if bit {
            Symbol::One
        } else {
            Symbol::Zero
        }
    }
}

impl From<Symbol> for bool {
    fn from(symbol: Symbol) -> Self {
        symbol.is_one()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Zero => write!(f, "0"),
            Symbol::One => write!(f, "1"),
        }
    }
}

/// What the environment returns each cycle.
///
/// Ordered so it can key a sorted map of chance-node children.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Percept {
    pub observation: Observation,
    pub reward: Reward,
}

impl Percept {
    pub fn new(observation: Observation, reward: Reward) -> Self {
        Self {
            observation,
            reward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_index_and_bool() {
        assert_eq!(Symbol::Zero.index(), 0);
        assert_eq!(Symbol::One.index(), 1);
        assert_eq!(Symbol::from(true), Symbol::One);
        assert!(!bool::from(Symbol::Zero));
        assert_eq!(Symbol::One.flip(), Symbol::Zero);
    }

    #[test]
    fn percept_orders_by_observation_then_reward() {
        let a = Percept::new(1, 5);
        let b = Percept::new(2, 0);
        let c = Percept::new(2, 1);
        assert!(a < b && b < c);
    }

    #[test]
    fn symbol_serialization() {
        assert_eq!(serde_json::to_string(&Symbol::One).unwrap(), "\"one\"");
    }
}
