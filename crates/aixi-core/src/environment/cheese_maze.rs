//! Find the cheese in a grid maze.
//!
//! The agent only sees which of its four neighbours are walls, as a bitmask
//! (up 8, right 4, down 2, left 1), so several cells look alike and the agent
//! has to remember where it has been. Actions are up, right, down, left.

use aixi_common::{Action, Error, Observation, Result, Reward};
use aixi_config::EnvironmentInterface;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use super::{check_action, make_rng, Environment};

/// Bumping into a wall (-10).
pub const REWARD_WALL: Reward = 0;
/// Moving to a free cell (-1).
pub const REWARD_MOVE: Reward = 9;
/// Reaching the cheese (+10).
pub const REWARD_CHEESE: Reward = 20;

/// Row/column offsets and observation bit for up, right, down, left.
const DIRECTIONS: [(isize, isize, u64); 4] = [(-1, 0, 8), (0, 1, 4), (1, 0, 2), (0, -1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Wall,
    Free,
    Cheese,
}

pub struct CheeseMaze {
    grid: Vec<Vec<Cell>>,
    start: Option<(usize, usize)>,
    position: (usize, usize),
    reward: Reward,
    rng: StdRng,
}

impl CheeseMaze {
    /// Build a maze from rows of `#` (wall), `.` (free) and `C` (cheese).
    pub fn new(layout: &[String], start: Option<[usize; 2]>, seed: Option<u64>) -> Result<Self> {
        let grid = layout
            .iter()
            .map(|row| {
                row.chars()
                    .map(|c| match c {
                        '#' => Ok(Cell::Wall),
                        '.' => Ok(Cell::Free),
                        'C' => Ok(Cell::Cheese),
                        other => Err(Error::Environment(format!("unknown maze cell '{other}'"))),
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let cheese_cells = grid.iter().flatten().filter(|&&c| c == Cell::Cheese).count();
        if cheese_cells != 1 {
            return Err(Error::Environment(format!(
                "maze needs exactly one cheese cell, found {cheese_cells}"
            )));
        }

        let start = start.map(|[r, c]| (r, c));
        if let Some((r, c)) = start {
            if grid.get(r).and_then(|row| row.get(c)) != Some(&Cell::Free) {
                return Err(Error::Environment(format!(
                    "maze start [{r}, {c}] is not a free cell"
                )));
            }
        }

        let mut maze = Self {
            grid,
            start,
            position: (0, 0),
            reward: REWARD_MOVE,
            rng: make_rng(seed),
        };
        maze.position = maze.pick_start().ok_or_else(|| {
            Error::Environment("maze has no free cell to start from".to_string())
        })?;
        Ok(maze)
    }

    fn pick_start(&mut self) -> Option<(usize, usize)> {
        if self.start.is_some() {
            return self.start;
        }
        let free: Vec<(usize, usize)> = self
            .grid
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, &cell)| cell == Cell::Free)
                    .map(move |(c, _)| (r, c))
            })
            .collect();
        free.choose(&mut self.rng).copied()
    }

    fn cell(&self, row: usize, col: usize) -> Cell {
        self.grid
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(Cell::Wall)
    }

    /// Neighbour in direction `dir`, if it is not a wall. Cells off the grid
    /// count as walls.
    fn neighbour(&self, dir: usize) -> Option<(usize, usize)> {
        let (dr, dc, _) = DIRECTIONS[dir];
        let row = self.position.0.checked_add_signed(dr)?;
        let col = self.position.1.checked_add_signed(dc)?;
        (self.cell(row, col) != Cell::Wall).then_some((row, col))
    }

    pub fn position(&self) -> (usize, usize) {
        self.position
    }
}

impl Environment for CheeseMaze {
    fn name(&self) -> &'static str {
        "cheese-maze"
    }

    fn interface(&self) -> EnvironmentInterface {
        EnvironmentInterface {
            actions: 4,
            observation_bits: 4,
            reward_bits: 5,
        }
    }

    fn observation(&self) -> Observation {
        (0..DIRECTIONS.len())
            .filter(|&dir| self.neighbour(dir).is_none())
            .map(|dir| DIRECTIONS[dir].2)
            .sum()
    }

    fn reward(&self) -> Reward {
        self.reward
    }

    fn perform_action(&mut self, action: Action) -> Result<()> {
        check_action(action, 4)?;
        self.reward = match self.neighbour(action as usize) {
            None => REWARD_WALL,
            Some(next) => {
                self.position = next;
                if self.cell(next.0, next.1) == Cell::Cheese {
                    REWARD_CHEESE
                } else {
                    REWARD_MOVE
                }
            }
        };
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.cell(self.position.0, self.position.1) == Cell::Cheese
    }

    fn reset(&mut self) {
        if let Some(start) = self.pick_start() {
            self.position = start;
        }
        self.reward = REWARD_MOVE;
    }
}
