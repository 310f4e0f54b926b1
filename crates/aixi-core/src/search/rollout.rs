//! Playouts past the search tree frontier.

use aixi_common::Action;
use aixi_config::RolloutPolicyKind;
use rand::Rng;

use crate::agent::Agent;

/// Chooses actions during a playout.
pub trait RolloutPolicy {
    fn select_action(&self, agent: &mut Agent) -> Action;
}

impl RolloutPolicy for RolloutPolicyKind {
    fn select_action(&self, agent: &mut Agent) -> Action {
        match self {
            RolloutPolicyKind::Uniform => agent.gen_random_action(),
            RolloutPolicyKind::SelfModel => self_model_action(agent),
        }
    }
}

/// Sample an action in proportion to the model's prediction of the agent's
/// own behaviour, renormalised over the legal actions.
fn self_model_action(agent: &mut Agent) -> Action {
    let weights: Vec<f64> = (0..agent.num_actions())
        .map(|a| agent.predicted_action_probability(a))
        .collect();
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return agent.gen_random_action();
    }

    let mut target = agent.rng_mut().random::<f64>() * total;
    for (action, weight) in weights.iter().enumerate() {
        if target < *weight {
            return action as Action;
        }
        target -= weight;
    }
    agent.num_actions() - 1
}

/// Simulate `length` cycles with the agent's configured rollout policy and
/// return the total simulated reward.
pub fn playout(agent: &mut Agent, length: u32) -> f64 {
    let policy = agent.params().rollout_policy;
    playout_with(agent, length, &policy)
}

pub fn playout_with<P: RolloutPolicy + ?Sized>(agent: &mut Agent, length: u32, policy: &P) -> f64 {
    let mut total = 0.0;
    for _ in 0..length {
        let action = policy.select_action(agent);
        agent.model_update_action(action);
        total += agent.gen_percept_and_update().reward as f64;
    }
    total
}
