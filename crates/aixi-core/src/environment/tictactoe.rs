//! Noughts and crosses against a uniformly random opponent.
//!
//! The action is the cell (0-8, row-major) to mark. The observation packs the
//! board two bits per cell, cell `i` at bits `2i..2i+2`: `01` for the agent's
//! mark and `10` for the opponent's. A finished game is replaced by an empty
//! board; an illegal move leaves the board as it was.

use aixi_common::{Action, Observation, Result, Reward};
use aixi_config::EnvironmentInterface;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use super::{check_action, make_rng, Environment};

/// Marking an occupied cell (-3).
pub const REWARD_ILLEGAL: Reward = 0;
/// Losing the game (-2).
pub const REWARD_LOSS: Reward = 1;
/// The game continues.
pub const REWARD_NEUTRAL: Reward = 3;
/// A full board with no winner (+1).
pub const REWARD_DRAW: Reward = 4;
/// Winning the game (+2).
pub const REWARD_WIN: Reward = 5;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Empty,
    Agent,
    Opponent,
}

pub struct TicTacToe {
    board: [Mark; 9],
    reward: Reward,
    rng: StdRng,
}

impl TicTacToe {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            board: [Mark::Empty; 9],
            reward: REWARD_NEUTRAL,
            rng: make_rng(seed),
        }
    }

    fn has_line(&self, mark: Mark) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&cell| self.board[cell] == mark))
    }

    fn is_full(&self) -> bool {
        self.board.iter().all(|&cell| cell != Mark::Empty)
    }

    fn clear_board(&mut self) {
        self.board = [Mark::Empty; 9];
    }

    fn opponent_move(&mut self) {
        let empty: Vec<usize> = (0..9).filter(|&i| self.board[i] == Mark::Empty).collect();
        if let Some(&cell) = empty.choose(&mut self.rng) {
            self.board[cell] = Mark::Opponent;
        }
    }
}

impl Environment for TicTacToe {
    fn name(&self) -> &'static str {
        "tictactoe"
    }

    fn interface(&self) -> EnvironmentInterface {
        EnvironmentInterface {
            actions: 9,
            observation_bits: 18,
            reward_bits: 3,
        }
    }

    fn observation(&self) -> Observation {
        self.board
            .iter()
            .enumerate()
            .map(|(i, mark)| {
                let code: u64 = match mark {
                    Mark::Empty => 0,
                    Mark::Agent => 1,
                    Mark::Opponent => 2,
                };
                code << (2 * i)
            })
            .sum()
    }

    fn reward(&self) -> Reward {
        self.reward
    }

    fn perform_action(&mut self, action: Action) -> Result<()> {
        check_action(action, 9)?;
        let cell = action as usize;
        if self.board[cell] != Mark::Empty {
            self.reward = REWARD_ILLEGAL;
            return Ok(());
        }

        self.board[cell] = Mark::Agent;
        self.reward = if self.has_line(Mark::Agent) {
            REWARD_WIN
        } else if self.is_full() {
            REWARD_DRAW
        } else {
            self.opponent_move();
            if self.has_line(Mark::Opponent) {
                REWARD_LOSS
            } else if self.is_full() {
                REWARD_DRAW
            } else {
                REWARD_NEUTRAL
            }
        };

        if self.reward != REWARD_NEUTRAL {
            self.clear_board();
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.clear_board();
        self.reward = REWARD_NEUTRAL;
    }
}
