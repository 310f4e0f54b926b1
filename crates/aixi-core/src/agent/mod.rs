//! The MC-AIXI-CTW agent: environment model, bookkeeping and update ordering.
//!
//! The agent owns the context tree and the live search tree. Every real or
//! simulated cycle feeds it a percept followed by an action:
//!
//! ```text
//! model_update_percept(o, r)  ->  model_update_action(a)  ->  model_update_percept ...
//! ```
//!
//! Speculative updates made by the planner are bracketed by
//! [`Agent::checkpoint`] and [`Agent::model_revert`], which rewinds the model
//! exactly. Breaking the ordering is a bug in the caller and panics.

mod journal;

pub use journal::{JournalEntry, UpdateKind};

use aixi_common::{decode, encode_into, max_value, Action, Observation, Percept, Reward, Symbol};
use aixi_config::AgentParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::predict::ContextTree;
use crate::search::DecisionNode;

/// Agent state captured by [`Agent::checkpoint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelUndo {
    lifetime: u64,
    reward: u64,
    history_size: usize,
    last_update_percept: bool,
    journal_len: usize,
    depth: usize,
}

impl ModelUndo {
    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    pub fn reward(&self) -> u64 {
        self.reward
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    pub fn last_update_percept(&self) -> bool {
        self.last_update_percept
    }
}

pub struct Agent {
    params: AgentParams,
    model: ContextTree,
    search_tree: DecisionNode,
    rng: StdRng,
    lifetime: u64,
    total_reward: u64,
    last_update_percept: bool,
    /// Updates applied while a checkpoint is open, oldest first.
    journal: Vec<JournalEntry>,
    open_checkpoints: usize,
    scratch: Vec<Symbol>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("params", &self.params)
            .field("lifetime", &self.lifetime)
            .field("total_reward", &self.total_reward)
            .field("history_size", &self.model.history_size())
            .field("model_nodes", &self.model.size())
            .field("search_tree_nodes", &self.search_tree.size())
            .finish()
    }
}

impl Agent {
    /// Create an agent with an empty model.
    ///
    /// With `seed` the agent's random choices are reproducible; without it
    /// the generator is seeded from the operating system.
    pub fn new(params: AgentParams, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            model: ContextTree::new(params.ct_depth),
            params,
            search_tree: DecisionNode::new(),
            rng,
            lifetime: 0,
            total_reward: 0,
            last_update_percept: false,
            journal: Vec::new(),
            open_checkpoints: 0,
            scratch: Vec::new(),
        }
    }

    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    /// Cycles completed (actions taken).
    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    pub fn total_reward(&self) -> u64 {
        self.total_reward
    }

    pub fn average_reward(&self) -> f64 {
        if self.lifetime > 0 {
            self.total_reward as f64 / self.lifetime as f64
        } else {
            0.0
        }
    }

    pub fn max_reward(&self) -> Reward {
        max_value(self.params.reward_bits)
    }

    pub fn min_reward(&self) -> Reward {
        0
    }

    pub fn num_actions(&self) -> u64 {
        self.params.actions
    }

    pub fn horizon(&self) -> u32 {
        self.params.horizon
    }

    pub fn history_size(&self) -> usize {
        self.model.history_size()
    }

    pub fn max_tree_depth(&self) -> usize {
        self.model.depth()
    }

    pub fn context_tree(&self) -> &ContextTree {
        &self.model
    }

    pub fn search_tree(&self) -> &DecisionNode {
        &self.search_tree
    }

    /// Whether the most recent model update was a percept.
    pub fn last_update_percept(&self) -> bool {
        self.last_update_percept
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(crate) fn take_search_tree(&mut self) -> DecisionNode {
        std::mem::take(&mut self.search_tree)
    }

    pub(crate) fn restore_search_tree(&mut self, tree: DecisionNode) {
        self.search_tree = tree;
    }

    pub fn is_action_ok(&self, action: Action) -> bool {
        action < self.params.actions
    }

    pub fn is_observation_ok(&self, observation: Observation) -> bool {
        observation <= max_value(self.params.observation_bits)
    }

    pub fn is_reward_ok(&self, reward: Reward) -> bool {
        (self.min_reward()..=self.max_reward()).contains(&reward)
    }

    /// Feed a percept to the model.
    ///
    /// # Panics
    ///
    /// Panics if the values do not fit the configured widths or the previous
    /// update was also a percept.
    pub fn model_update_percept(&mut self, observation: Observation, reward: Reward) {
        assert!(
            self.is_observation_ok(observation),
            "observation {observation} does not fit in {} bits",
            self.params.observation_bits
        );
        assert!(
            self.is_reward_ok(reward),
            "reward {reward} outside [{}, {}]",
            self.min_reward(),
            self.max_reward()
        );
        assert!(
            !self.last_update_percept,
            "percept update must follow an action update"
        );

        let mut symbols = std::mem::take(&mut self.scratch);
        symbols.clear();
        encode_into(&mut symbols, observation, self.params.observation_bits);
        encode_into(&mut symbols, reward, self.params.reward_bits);
        self.apply_block(UpdateKind::Percept, &symbols);
        self.scratch = symbols;

        self.total_reward += reward;
        self.last_update_percept = true;
    }

    /// Feed the agent's own action to the model and advance its lifetime.
    ///
    /// # Panics
    ///
    /// Panics on an illegal action or if the previous update was not a percept.
    pub fn model_update_action(&mut self, action: Action) {
        assert!(
            self.is_action_ok(action),
            "action {action} is not one of the {} legal actions",
            self.params.actions
        );
        assert!(
            self.last_update_percept,
            "action update must follow a percept update"
        );

        let mut symbols = std::mem::take(&mut self.scratch);
        symbols.clear();
        encode_into(&mut symbols, action, self.params.action_bits());
        self.apply_block(UpdateKind::Action, &symbols);
        self.scratch = symbols;

        self.lifetime += 1;
        self.last_update_percept = false;
    }

    /// Push one encoded block; while the history is shorter than the context
    /// depth it is only appended to the history.
    fn apply_block(&mut self, kind: UpdateKind, symbols: &[Symbol]) {
        let modelled = self.model.history_size() >= self.model.depth();
        if modelled {
            self.model.push_symbols(symbols);
        } else {
            self.model.update_history(symbols);
        }
        self.record(kind, symbols.len(), modelled);
    }

    fn record(&mut self, kind: UpdateKind, symbols: usize, modelled: bool) {
        if self.open_checkpoints > 0 {
            self.journal.push(JournalEntry {
                kind,
                symbols: symbols as u32,
                modelled,
            });
        }
    }

    fn split_percept(&self, symbols: &[Symbol]) -> Percept {
        let (obs, rew) = symbols.split_at(self.params.observation_bits as usize);
        Percept::new(decode(obs), decode(rew))
    }

    /// Sample a percept from the model without changing it.
    pub fn gen_percept(&mut self) -> Percept {
        let bits = (self.params.observation_bits + self.params.reward_bits) as usize;
        let symbols = self.model.gen_random_symbols(&mut self.rng, bits);
        self.split_percept(&symbols)
    }

    /// Sample a percept from the model and update the model with it, as if
    /// it had been received.
    ///
    /// # Panics
    ///
    /// Panics if the previous update was also a percept.
    pub fn gen_percept_and_update(&mut self) -> Percept {
        assert!(
            !self.last_update_percept,
            "percept update must follow an action update"
        );
        let bits = (self.params.observation_bits + self.params.reward_bits) as usize;
        let symbols = self.model.gen_random_symbols_and_update(&mut self.rng, bits);
        self.record(UpdateKind::Percept, bits, true);

        let percept = self.split_percept(&symbols);
        self.total_reward += percept.reward;
        self.last_update_percept = true;
        percept
    }

    /// A uniformly random legal action.
    pub fn gen_random_action(&mut self) -> Action {
        self.rng.random_range(0..self.params.actions)
    }

    /// Snapshot the agent for a later [`model_revert`](Self::model_revert).
    ///
    /// Checkpoints nest and must be reverted in LIFO order.
    pub fn checkpoint(&mut self) -> ModelUndo {
        self.open_checkpoints += 1;
        ModelUndo {
            lifetime: self.lifetime,
            reward: self.total_reward,
            history_size: self.model.history_size(),
            last_update_percept: self.last_update_percept,
            journal_len: self.journal.len(),
            depth: self.open_checkpoints,
        }
    }

    /// Rewind every update made since `undo` was taken.
    ///
    /// # Panics
    ///
    /// Panics if `undo` is not the innermost open checkpoint, or if the
    /// number of reverted symbols disagrees with the cycles elapsed.
    pub fn model_revert(&mut self, undo: ModelUndo) {
        assert_eq!(
            undo.depth, self.open_checkpoints,
            "checkpoints must be reverted in LIFO order"
        );
        assert!(
            self.lifetime >= undo.lifetime && self.journal.len() >= undo.journal_len,
            "checkpoint is newer than the agent state"
        );

        let mut reverted: u64 = 0;
        for entry in self.journal.drain(undo.journal_len..).rev() {
            if entry.modelled {
                self.model.pop_symbols(entry.symbols as usize);
            } else {
                let len = self.model.history_size() - entry.symbols as usize;
                self.model.revert_history(len);
            }
            reverted += u64::from(entry.symbols);
        }

        let expected = (self.lifetime - undo.lifetime) * u64::from(self.params.bits_per_cycle());
        assert_eq!(
            reverted, expected,
            "reverted {reverted} symbols but {} cycles elapsed since the checkpoint",
            self.lifetime - undo.lifetime
        );
        assert_eq!(
            self.model.history_size(),
            undo.history_size,
            "history length not restored by revert"
        );

        self.lifetime = undo.lifetime;
        self.total_reward = undo.reward;
        self.last_update_percept = undo.last_update_percept;
        self.open_checkpoints -= 1;
    }

    fn speculative_probability(&mut self, symbols: &[Symbol]) -> f64 {
        let log_prob: f64 = symbols
            .iter()
            .map(|&sym| self.model.log_prob_next_symbol_with_update(sym))
            .sum();
        self.model.pop_symbols(symbols.len());
        log_prob.exp2()
    }

    /// The model's probability that the agent itself takes `action` next.
    pub fn predicted_action_probability(&mut self, action: Action) -> f64 {
        assert!(self.is_action_ok(action), "action {action} out of range");
        let mut symbols = std::mem::take(&mut self.scratch);
        symbols.clear();
        encode_into(&mut symbols, action, self.params.action_bits());
        let p = self.speculative_probability(&symbols);
        self.scratch = symbols;
        p
    }

    /// The model's probability of receiving `(observation, reward)` next.
    pub fn percept_probability(&mut self, observation: Observation, reward: Reward) -> f64 {
        assert!(self.is_observation_ok(observation) && self.is_reward_ok(reward));
        let mut symbols = std::mem::take(&mut self.scratch);
        symbols.clear();
        encode_into(&mut symbols, observation, self.params.observation_bits);
        encode_into(&mut symbols, reward, self.params.reward_bits);
        let p = self.speculative_probability(&symbols);
        self.scratch = symbols;
        p
    }

    /// Forget the model, the search tree and all counters.
    pub fn reset(&mut self) {
        assert_eq!(self.open_checkpoints, 0, "reset with an open checkpoint");
        self.model.clear();
        self.search_tree = DecisionNode::new();
        self.lifetime = 0;
        self.total_reward = 0;
        self.last_update_percept = false;
        self.journal.clear();
    }

    /// Keep the model but restart lifetime and reward accounting.
    pub fn new_episode(&mut self) {
        self.lifetime = 0;
        self.total_reward = 0;
    }

    /// Switch to new parameters, keeping what the model has learned.
    ///
    /// A different context depth cannot reuse the tree, so the model starts
    /// over in that case.
    pub fn reconfigure(&mut self, params: AgentParams) {
        assert_eq!(self.open_checkpoints, 0, "reconfigure with an open checkpoint");
        if params.ct_depth != self.model.depth() {
            debug!(
                old_depth = self.model.depth(),
                new_depth = params.ct_depth,
                "context depth changed, starting a fresh model"
            );
            self.model = ContextTree::new(params.ct_depth);
        }
        self.params = params;
        self.search_tree = DecisionNode::new();
    }

    /// Discard the search tree.
    pub fn search_tree_reset(&mut self) {
        self.search_tree = DecisionNode::new();
    }

    /// Keep only the subtree reached by taking `action` and receiving
    /// `percept`, or start afresh if it was never explored.
    pub fn search_tree_prune(&mut self, action: Action, percept: Percept) {
        let root = std::mem::take(&mut self.search_tree);
        self.search_tree = root.into_child(action, percept).unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin_agent(depth: usize) -> Agent {
        Agent::new(AgentParams::with_widths(2, 1, 1).with_ct_depth(depth), Some(1))
    }

    #[test]
    fn test_update_ordering_and_counters() {
        let mut agent = coin_agent(2);
        agent.model_update_percept(1, 1);
        assert!(agent.last_update_percept());
        assert_eq!(agent.total_reward(), 1);
        agent.model_update_action(0);
        assert_eq!(agent.lifetime(), 1);
        assert_eq!(agent.history_size(), 3);
        assert!((agent.average_reward() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_priming_appends_history_only() {
        let mut agent = coin_agent(4);
        agent.model_update_percept(1, 0);
        assert_eq!(agent.history_size(), 2);
        assert_eq!(agent.context_tree().root().visits(), 0);

        agent.model_update_action(1);
        agent.model_update_percept(0, 1);
        // History had 3 symbols, still below depth 4.
        assert_eq!(agent.context_tree().root().visits(), 0);

        agent.model_update_action(1);
        // History had 5 symbols: the action is modelled.
        assert_eq!(agent.context_tree().root().visits(), 1);
    }

    #[test]
    #[should_panic(expected = "must follow a percept")]
    fn test_double_action_update_panics() {
        let mut agent = coin_agent(2);
        agent.model_update_percept(0, 0);
        agent.model_update_action(1);
        agent.model_update_action(1);
    }

    #[test]
    #[should_panic(expected = "must follow an action")]
    fn test_double_percept_update_panics() {
        let mut agent = coin_agent(2);
        agent.model_update_percept(0, 0);
        agent.model_update_percept(0, 0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_reward_out_of_range_panics() {
        let mut agent = coin_agent(2);
        agent.model_update_percept(0, 2);
    }

    #[test]
    fn test_checkpoint_revert_restores_state() {
        let mut agent = coin_agent(2);
        for _ in 0..4 {
            agent.model_update_percept(1, 1);
            agent.model_update_action(1);
        }
        agent.model_update_percept(1, 1);

        let log_prob = agent.context_tree().log_block_probability();
        let undo = agent.checkpoint();
        for _ in 0..3 {
            agent.model_update_action(0);
            agent.gen_percept_and_update();
        }
        assert_eq!(agent.lifetime(), 7);
        agent.model_revert(undo);

        assert_eq!(agent.lifetime(), 4);
        assert_eq!(agent.total_reward(), 5);
        assert_eq!(agent.history_size(), 14);
        assert!(agent.last_update_percept());
        assert!((agent.context_tree().log_block_probability() - log_prob).abs() < 1e-9);
    }

    #[test]
    fn test_nested_checkpoints_revert_lifo() {
        let mut agent = coin_agent(1);
        agent.model_update_percept(0, 0);
        let outer = agent.checkpoint();
        agent.model_update_action(1);
        agent.gen_percept_and_update();
        let inner = agent.checkpoint();
        agent.model_update_action(0);
        agent.gen_percept_and_update();
        agent.model_revert(inner);
        assert_eq!(agent.lifetime(), 1);
        agent.model_revert(outer);
        assert_eq!(agent.lifetime(), 0);
        assert_eq!(agent.history_size(), 2);
    }

    #[test]
    #[should_panic(expected = "LIFO")]
    fn test_out_of_order_revert_panics() {
        let mut agent = coin_agent(1);
        agent.model_update_percept(0, 0);
        let outer = agent.checkpoint();
        let _inner = agent.checkpoint();
        agent.model_revert(outer);
    }

    #[test]
    fn test_probabilities_are_pure_queries() {
        let mut agent = coin_agent(2);
        for _ in 0..10 {
            agent.model_update_percept(1, 1);
            agent.model_update_action(1);
        }
        let size = agent.history_size();

        let p_action: f64 = (0..2).map(|a| agent.predicted_action_probability(a)).sum();
        assert!((p_action - 1.0).abs() < 1e-9);

        let p_percept: f64 = (0..2)
            .flat_map(|o| (0..2).map(move |r| (o, r)))
            .map(|(o, r)| agent.percept_probability(o, r))
            .sum();
        assert!((p_percept - 1.0).abs() < 1e-9);
        assert_eq!(agent.history_size(), size);
    }

    #[test]
    fn test_gen_percept_is_in_range_and_pure() {
        let mut agent = Agent::new(AgentParams::with_widths(4, 4, 5), Some(3));
        for _ in 0..5 {
            agent.model_update_percept(5, 9);
            agent.model_update_action(2);
        }
        let size = agent.history_size();
        for _ in 0..20 {
            let percept = agent.gen_percept();
            assert!(agent.is_observation_ok(percept.observation));
            assert!(agent.is_reward_ok(percept.reward));
        }
        assert_eq!(agent.history_size(), size);
    }

    #[test]
    fn test_random_actions_are_legal() {
        let mut agent = Agent::new(AgentParams::with_widths(9, 18, 3), Some(5));
        for _ in 0..200 {
            let a = agent.gen_random_action();
            assert!(agent.is_action_ok(a));
        }
    }

    #[test]
    fn test_reset_and_new_episode() {
        let mut agent = coin_agent(1);
        agent.model_update_percept(1, 1);
        agent.model_update_action(1);
        agent.model_update_percept(1, 1);
        agent.model_update_action(1);

        agent.new_episode();
        assert_eq!(agent.lifetime(), 0);
        assert_eq!(agent.total_reward(), 0);
        assert_eq!(agent.history_size(), 6);

        agent.reset();
        assert_eq!(agent.history_size(), 0);
        assert_eq!(agent.context_tree().size(), 1);
    }

    #[test]
    fn test_reconfigure_keeps_model_for_same_depth() {
        let mut agent = coin_agent(1);
        agent.model_update_percept(1, 1);
        agent.model_update_action(1);
        agent.model_update_percept(1, 1);
        let nodes = agent.context_tree().size();

        agent.reconfigure(AgentParams::with_widths(3, 2, 2).with_ct_depth(1));
        assert_eq!(agent.num_actions(), 3);
        assert_eq!(agent.context_tree().size(), nodes);

        agent.reconfigure(AgentParams::with_widths(3, 2, 2).with_ct_depth(4));
        assert_eq!(agent.max_tree_depth(), 4);
        assert_eq!(agent.history_size(), 0);
    }
}
