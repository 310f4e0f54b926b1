//! Binary Context Tree Weighting predictor with exact rollback.
//!
//! Every node keeps the Krichevsky-Trofimov (KT) block estimate of the bits
//! seen in its context and the weighted probability
//!
//! ```text
//! P_w(s) = P_KT(s)                              s has no children
//! P_w(s) = 1/2 P_KT(s) + 1/2 P_w(0s) P_w(1s)   otherwise (missing child = 1)
//! ```
//!
//! The root's weighted probability is the probability of the whole history
//! under the mixture, so the conditional probability of the next bit is a
//! difference of two root values. The planner asks "what if" many thousands of
//! times per decision; every update therefore has an exact inverse, and
//! children whose counts fall back to zero are freed.
//!
//! # Usage
//!
//! ```
//! use aixi_common::Symbol;
//! use aixi_core::predict::ContextTree;
//!
//! let mut tree = ContextTree::new(3);
//! for _ in 0..20 {
//!     tree.push_symbol(Symbol::One);
//! }
//! let p_one = tree.predict(&[Symbol::One]);
//! assert!(p_one > 0.9);
//!
//! // Queries leave the tree untouched.
//! assert_eq!(tree.history_size(), 20);
//! ```

use aixi_common::Symbol;
use aixi_math::{weighted_log2_mixture, KtCounts};
use rand::Rng;
use serde::Serialize;

/// Node in the context tree.
#[derive(Debug, Clone, Default)]
pub struct CtNode {
    counts: KtCounts,
    /// log2 KT block estimate of the bits seen in this context.
    log_kt: f64,
    /// log2 weighted probability of this subtree.
    log_weighted: f64,
    /// Children indexed by the next-older context bit.
    children: [Option<Box<CtNode>>; 2],
}

impl CtNode {
    pub fn counts(&self) -> KtCounts {
        self.counts
    }

    /// Number of bits seen in this context.
    pub fn visits(&self) -> u64 {
        self.counts.total()
    }

    pub fn log_kt(&self) -> f64 {
        self.log_kt
    }

    pub fn log_weighted(&self) -> f64 {
        self.log_weighted
    }

    pub fn child(&self, sym: Symbol) -> Option<&CtNode> {
        self.children[sym.index()].as_deref()
    }

    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(|child| child.size())
            .sum::<usize>()
    }

    /// `context` is the history, most recent bit last.
    fn update(&mut self, context: &[Symbol], depth_left: usize, sym: Symbol) {
        if depth_left > 0 {
            if let Some((&ctx, rest)) = context.split_last() {
                let child = self.children[ctx.index()].get_or_insert_with(Box::default);
                child.update(rest, depth_left - 1, sym);
            }
        }

        // KT multiplier uses the counts before the increment.
        self.log_kt += self.counts.log2_multiplier(sym.is_one());
        self.counts.increment(sym.is_one());
        self.recompute_weighted();
    }

    fn revert(&mut self, context: &[Symbol], depth_left: usize, sym: Symbol) {
        if depth_left > 0 {
            if let Some((&ctx, rest)) = context.split_last() {
                let slot = &mut self.children[ctx.index()];
                let Some(child) = slot.as_mut() else {
                    panic!("context tree revert without matching update: missing child");
                };
                child.revert(rest, depth_left - 1, sym);
                if child.visits() == 0 {
                    *slot = None;
                }
            }
        }

        self.counts.decrement(sym.is_one());
        if self.counts.total() == 0 {
            // Snap to the empty estimate instead of carrying rounding residue.
            self.log_kt = 0.0;
        } else {
            self.log_kt -= self.counts.log2_multiplier(sym.is_one());
        }
        self.recompute_weighted();
    }

    fn recompute_weighted(&mut self) {
        self.log_weighted = match &self.children {
            [None, None] => self.log_kt,
            [zero, one] => {
                let children = zero.as_ref().map_or(0.0, |c| c.log_weighted)
                    + one.as_ref().map_or(0.0, |c| c.log_weighted);
                weighted_log2_mixture(self.log_kt, children)
            }
        };
        debug_assert!(
            self.log_weighted.is_finite(),
            "non-finite weighted log-probability (kt={}, counts={:?})",
            self.log_kt,
            self.counts
        );
    }
}

/// Summary of a context tree for logs and telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextTreeStats {
    pub depth: usize,
    pub nodes: usize,
    pub history_size: usize,
    pub log_block_probability: f64,
}

/// The agent's environment model: a depth-bounded context tree plus the
/// interaction history it conditions on.
#[derive(Debug, Clone)]
pub struct ContextTree {
    root: CtNode,
    history: Vec<Symbol>,
    depth: usize,
}

impl ContextTree {
    /// Create an empty tree conditioning on at most `depth` past bits.
    pub fn new(depth: usize) -> Self {
        Self {
            root: CtNode::default(),
            history: Vec::new(),
            depth,
        }
    }

    /// Forget all statistics and history.
    pub fn clear(&mut self) {
        self.root = CtNode::default();
        self.history.clear();
    }

    /// Update statistics along the current context with `sym`.
    ///
    /// The history is not extended; see [`push_symbol`](Self::push_symbol).
    pub fn update(&mut self, sym: Symbol) {
        let ContextTree {
            root,
            history,
            depth,
        } = self;
        root.update(history, *depth, sym);
    }

    /// Exact inverse of [`update`](Self::update) at the same history.
    ///
    /// # Panics
    ///
    /// Panics if `sym` was never added in the current context.
    pub fn revert(&mut self, sym: Symbol) {
        let ContextTree {
            root,
            history,
            depth,
        } = self;
        root.revert(history, *depth, sym);
    }

    /// Append symbols to the history without touching statistics.
    pub fn update_history(&mut self, symbols: &[Symbol]) {
        self.history.extend_from_slice(symbols);
    }

    /// Truncate the history to `new_len` symbols without touching statistics.
    pub fn revert_history(&mut self, new_len: usize) {
        assert!(
            new_len <= self.history.len(),
            "cannot revert history of {} symbols to {}",
            self.history.len(),
            new_len
        );
        self.history.truncate(new_len);
    }

    /// Update statistics with `sym`, then append it to the history.
    pub fn push_symbol(&mut self, sym: Symbol) {
        self.update(sym);
        self.history.push(sym);
    }

    pub fn push_symbols(&mut self, symbols: &[Symbol]) {
        for &sym in symbols {
            self.push_symbol(sym);
        }
    }

    /// Remove the most recent history symbol and revert its statistics.
    ///
    /// # Panics
    ///
    /// Panics on an empty history.
    pub fn pop_symbol(&mut self) -> Symbol {
        let Some(sym) = self.history.pop() else {
            panic!("pop_symbol on empty history");
        };
        self.revert(sym);
        sym
    }

    pub fn pop_symbols(&mut self, count: usize) {
        for _ in 0..count {
            self.pop_symbol();
        }
    }

    /// log2 P(next bit = `sym` | history). Leaves the tree unchanged.
    pub fn log_prob_next_symbol(&mut self, sym: Symbol) -> f64 {
        let log_prob = self.log_prob_next_symbol_with_update(sym);
        self.pop_symbol();
        log_prob
    }

    /// Like [`log_prob_next_symbol`](Self::log_prob_next_symbol) but keeps
    /// `sym` pushed; the caller owns the cleanup.
    pub fn log_prob_next_symbol_with_update(&mut self, sym: Symbol) -> f64 {
        let before = self.root.log_weighted;
        self.push_symbol(sym);
        self.root.log_weighted - before
    }

    /// Sample `bits` symbols from the model, pushing each before drawing the
    /// next so later bits condition on earlier ones.
    pub fn gen_random_symbols_and_update<R: Rng>(&mut self, rng: &mut R, bits: usize) -> Vec<Symbol> {
        let mut out = Vec::with_capacity(bits);
        for _ in 0..bits {
            let u: f64 = rng.random();
            let log_p_zero = self.log_prob_next_symbol_with_update(Symbol::Zero);
            let sym = if u < log_p_zero.exp2() {
                Symbol::Zero
            } else {
                self.pop_symbol();
                self.push_symbol(Symbol::One);
                Symbol::One
            };
            out.push(sym);
        }
        out
    }

    /// Sample `bits` symbols from the model without changing it.
    pub fn gen_random_symbols<R: Rng>(&mut self, rng: &mut R, bits: usize) -> Vec<Symbol> {
        let out = self.gen_random_symbols_and_update(rng, bits);
        self.pop_symbols(out.len());
        out
    }

    /// log2 probability of the entire history under the mixture.
    pub fn log_block_probability(&self) -> f64 {
        self.root.log_weighted
    }

    /// Probability that `symbols` follow the current history.
    pub fn predict(&mut self, symbols: &[Symbol]) -> f64 {
        let before = self.root.log_weighted;
        self.push_symbols(symbols);
        let after = self.root.log_weighted;
        self.pop_symbols(symbols.len());
        (after - before).exp2()
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        self.root.size()
    }

    /// Maximum context depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[Symbol] {
        &self.history
    }

    /// The `n`-th symbol of the history, counting from the oldest.
    pub fn nth_history_symbol(&self, n: usize) -> Option<Symbol> {
        self.history.get(n).copied()
    }

    pub fn root(&self) -> &CtNode {
        &self.root
    }

    pub fn stats(&self) -> ContextTreeStats {
        ContextTreeStats {
            depth: self.depth,
            nodes: self.size(),
            history_size: self.history.len(),
            log_block_probability: self.log_block_probability(),
        }
    }
}
