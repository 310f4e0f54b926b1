//! Search tree nodes.
//!
//! Decision nodes (agent to act) and chance nodes (environment to respond)
//! alternate. Both keep a visit count and the running mean of the returns
//! sampled through them.

use std::collections::BTreeMap;

use aixi_common::{Action, Percept};
use rand::seq::IndexedRandom;
use rand::Rng;

use super::rollout::playout;
use crate::agent::Agent;

/// `mean' = (value + n * mean) / (n + 1)`
fn running_mean(mean: f64, visits: u64, value: f64) -> f64 {
    (value + visits as f64 * mean) / (visits as f64 + 1.0)
}

/// A node where the agent chooses an action.
#[derive(Debug, Clone, Default)]
pub struct DecisionNode {
    visits: u64,
    mean: f64,
    children: BTreeMap<Action, ChanceNode>,
}

impl DecisionNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }

    /// Mean return of the samples through this node.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn child(&self, action: Action) -> Option<&ChanceNode> {
        self.children.get(&action)
    }

    pub fn children(&self) -> impl Iterator<Item = (Action, &ChanceNode)> {
        self.children.iter().map(|(&a, c)| (a, c))
    }

    /// Nodes in this subtree, both kinds, including this one.
    pub fn size(&self) -> usize {
        1 + self.children.values().map(ChanceNode::size).sum::<usize>()
    }

    /// Detach the subtree reached by `action` then `percept`.
    pub fn into_child(mut self, action: Action, percept: Percept) -> Option<DecisionNode> {
        self.children.remove(&action)?.children.remove(&percept)
    }

    /// Run one simulation from this node at `depth` cycles below the root
    /// and return the reward accumulated up to the horizon.
    pub fn sample(&mut self, agent: &mut Agent, depth: u32) -> f64 {
        let horizon = agent.horizon();
        if depth >= horizon {
            return 0.0;
        }

        let reward = if self.visits == 0 {
            playout(agent, horizon - depth)
        } else {
            let action = self.select_action(agent);
            agent.model_update_action(action);
            self.children.entry(action).or_default().sample(agent, depth)
        };

        self.mean = running_mean(self.mean, self.visits, reward);
        self.visits += 1;
        reward
    }

    /// Pick the action to simulate: an unexpanded one uniformly at random
    /// while any remain, otherwise the UCB1 maximiser.
    pub fn select_action(&mut self, agent: &mut Agent) -> Action {
        let num_actions = agent.num_actions();
        if (self.children.len() as u64) < num_actions {
            let unexpanded: Vec<Action> = (0..num_actions)
                .filter(|a| !self.children.contains_key(a))
                .collect();
            let action = unexpanded[agent.rng_mut().random_range(0..unexpanded.len())];
            self.children.insert(action, ChanceNode::new());
            return action;
        }

        // Means are normalised by the largest return reachable in a horizon.
        let scale = f64::from(agent.horizon()) * (agent.max_reward() - agent.min_reward()) as f64;
        let weight = agent.params().exploration_weight;
        let log_visits = (self.visits as f64).log2();

        let mut best: Vec<Action> = Vec::new();
        let mut best_score = f64::NEG_INFINITY;
        for (&action, child) in &self.children {
            let score = if child.visits == 0 {
                f64::INFINITY
            } else {
                child.mean / scale + weight * (log_visits / child.visits as f64).sqrt()
            };
            if score > best_score {
                best_score = score;
                best.clear();
                best.push(action);
            } else if score == best_score {
                best.push(action);
            }
        }

        match best.choose(agent.rng_mut()) {
            Some(&action) => action,
            None => agent.gen_random_action(),
        }
    }

    /// The child action with the highest mean return, ties broken uniformly
    /// at random. `None` when nothing has been expanded.
    pub fn best_action<R: Rng>(&self, rng: &mut R) -> Option<Action> {
        let best_mean = self
            .children
            .values()
            .map(|c| c.mean)
            .fold(f64::NEG_INFINITY, f64::max);
        let best: Vec<Action> = self
            .children
            .iter()
            .filter(|(_, c)| c.mean == best_mean)
            .map(|(&a, _)| a)
            .collect();
        best.choose(rng).copied()
    }
}

/// A node where the environment (as modelled) responds with a percept.
#[derive(Debug, Clone, Default)]
pub struct ChanceNode {
    visits: u64,
    mean: f64,
    children: BTreeMap<Percept, DecisionNode>,
}

impl ChanceNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn child(&self, percept: &Percept) -> Option<&DecisionNode> {
        self.children.get(percept)
    }

    /// Number of distinct percepts branched on.
    pub fn branch_count(&self) -> usize {
        self.children.len()
    }

    pub fn size(&self) -> usize {
        1 + self.children.values().map(DecisionNode::size).sum::<usize>()
    }

    /// The decision node for `percept`, created if needed. Once `cap`
    /// branches exist, unseen percepts share a randomly chosen existing child.
    pub fn child_for_percept<R: Rng>(
        &mut self,
        percept: Percept,
        cap: usize,
        rng: &mut R,
    ) -> &mut DecisionNode {
        let overflow =
            !self.children.contains_key(&percept) && self.children.len() >= cap.max(1);
        let key = if overflow {
            let index = rng.random_range(0..self.children.len());
            self.children.keys().nth(index).copied().unwrap_or(percept)
        } else {
            percept
        };
        self.children.entry(key).or_default()
    }

    /// Sample a percept from the model, then continue in the matching
    /// decision node one cycle deeper.
    pub fn sample(&mut self, agent: &mut Agent, depth: u32) -> f64 {
        if depth >= agent.horizon() {
            return 0.0;
        }

        let percept = agent.gen_percept_and_update();
        let cap = agent.params().max_percept_branches;
        let child = self.child_for_percept(percept, cap, agent.rng_mut());
        let reward = percept.reward as f64 + child.sample(agent, depth + 1);

        self.mean = running_mean(self.mean, self.visits, reward);
        self.visits += 1;
        reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_running_mean() {
        let mut mean = 0.0;
        for (n, v) in [4.0, 2.0, 6.0].into_iter().enumerate() {
            mean = running_mean(mean, n as u64, v);
        }
        assert!((mean - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_branch_cap_routes_to_existing_child() {
        let mut node = ChanceNode::new();
        let mut rng = StdRng::seed_from_u64(9);
        for obs in 0..10 {
            node.child_for_percept(Percept::new(obs, 0), 3, &mut rng);
        }
        assert_eq!(node.branch_count(), 3);
        assert!(node.child(&Percept::new(0, 0)).is_some());
        assert!(node.child(&Percept::new(9, 0)).is_none());
    }

    #[test]
    fn test_known_percept_reuses_child() {
        let mut node = ChanceNode::new();
        let mut rng = StdRng::seed_from_u64(1);
        node.child_for_percept(Percept::new(1, 1), 1, &mut rng);
        node.child_for_percept(Percept::new(1, 1), 1, &mut rng);
        assert_eq!(node.branch_count(), 1);
        assert_eq!(node.size(), 2);
    }

    #[test]
    fn test_best_action_on_empty_node() {
        let node = DecisionNode::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(node.best_action(&mut rng), None);
        assert_eq!(node.size(), 1);
    }

    #[test]
    fn test_into_child_detaches_subtree() {
        let mut chance = ChanceNode::new();
        let mut rng = StdRng::seed_from_u64(0);
        chance.child_for_percept(Percept::new(2, 1), 10, &mut rng);
        let mut root = DecisionNode::new();
        root.children.insert(1, chance);

        assert_eq!(root.size(), 3);
        assert!(root.clone().into_child(1, Percept::new(2, 1)).is_some());
        assert!(root.clone().into_child(0, Percept::new(2, 1)).is_none());
        assert!(root.into_child(1, Percept::new(0, 0)).is_none());
    }
}
