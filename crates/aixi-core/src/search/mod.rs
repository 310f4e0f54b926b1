//! Monte-Carlo tree search (UCT) over the agent's learned model.
//!
//! Each simulation checkpoints the agent, samples one trajectory through the
//! search tree to the horizon, and reverts the model. The budget is polled
//! between whole simulations, so a search may overrun its timeout by one
//! simulation.

pub mod node;
pub mod rollout;

pub use node::{ChanceNode, DecisionNode};
pub use rollout::{playout, playout_with, RolloutPolicy};

use std::time::Instant;

use aixi_common::Action;
use tracing::debug;

use crate::agent::Agent;
use crate::logging::event_names;

/// Plan from the agent's current state and return the best action.
///
/// The agent's search tree is grown in place, so a pruned tree from the
/// previous cycle is reused. With nothing explored (for example a zero
/// budget) a uniformly random legal action is returned.
///
/// # Panics
///
/// Panics unless the last model update was a percept.
pub fn search(agent: &mut Agent) -> Action {
    assert!(
        agent.last_update_percept(),
        "search must start right after a percept update"
    );

    let started = Instant::now();
    let timeout = agent.params().search_timeout();
    let max_simulations = agent.params().max_simulations;

    let mut root = agent.take_search_tree();
    let mut simulations: u64 = 0;
    while started.elapsed() < timeout && max_simulations.is_none_or(|cap| simulations < cap) {
        let undo = agent.checkpoint();
        root.sample(agent, 0);
        agent.model_revert(undo);
        simulations += 1;
    }

    let action = match root.best_action(agent.rng_mut()) {
        Some(action) => action,
        None => agent.gen_random_action(),
    };

    debug!(
        event = event_names::PLAN_FINISHED,
        simulations,
        elapsed_ms = started.elapsed().as_millis() as u64,
        tree_size = root.size(),
        root_visits = root.visits(),
        action,
        "plan.finished"
    );

    agent.restore_search_tree(root);
    action
}
