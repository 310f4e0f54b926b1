//! Krichevsky-Trofimov estimator for binary sequences.
//!
//! The KT estimator is the Bayesian sequential estimate under a Beta(1/2, 1/2)
//! prior:
//!
//! ```text
//! P_KT(x_{n+1} = s | a zeros, b ones) = (count(s) + 1/2) / (a + b + 1)
//! ```
//!
//! Context-tree nodes keep a running log2 block estimate by adding the log of
//! this multiplier before each count increment. The closed form
//! [`kt_log2_block`] exists to cross-check that running sum.
//!
//! # Example
//!
//! ```
//! use aixi_math::{kt_log2_multiplier, KtCounts};
//!
//! // An empty context predicts either symbol with probability 1/2.
//! assert_eq!(kt_log2_multiplier(0, 0), -1.0);
//!
//! let mut counts = KtCounts::default();
//! counts.increment(true);
//! assert_eq!(counts.total(), 1);
//! assert!((counts.log2_multiplier(true) - 0.75f64.log2()).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use super::stable::{ln_to_log2, log2_add_exp2, log_gamma};

/// Pseudo-count added to every symbol (Jeffreys prior).
pub const KT_PSEUDO_COUNT: f64 = 0.5;

/// log2 of the KT predictive probability of a symbol seen `count_sym` times
/// out of `count_total`.
#[inline]
pub fn kt_log2_multiplier(count_sym: u64, count_total: u64) -> f64 {
    ((count_sym as f64 + KT_PSEUDO_COUNT) / (count_total as f64 + 1.0)).log2()
}

/// Closed-form log2 KT block probability for a sequence with the given
/// symbol counts (order does not matter).
pub fn kt_log2_block(zeros: u64, ones: u64) -> f64 {
    let a = zeros as f64;
    let b = ones as f64;
    // Gamma(1/2)^2 = pi
    let ln_block = log_gamma(a + 0.5) + log_gamma(b + 0.5)
        - std::f64::consts::PI.ln()
        - log_gamma(a + b + 1.0);
    ln_to_log2(ln_block)
}

/// CTW mixture of a node's own KT estimate with the product of its
/// children's weighted estimates (both in log2):
/// `log2(0.5 * 2^kt + 0.5 * 2^children)`.
#[inline]
pub fn weighted_log2_mixture(kt_log2: f64, children_log2: f64) -> f64 {
    log2_add_exp2(kt_log2, children_log2) - 1.0
}

/// Zero/one counts seen in one binary context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KtCounts {
    pub zeros: u64,
    pub ones: u64,
}

impl KtCounts {
    pub fn total(&self) -> u64 {
        self.zeros + self.ones
    }

    pub fn get(&self, one: bool) -> u64 {
        if one {
            self.ones
        } else {
            self.zeros
        }
    }

    /// log2 predictive probability of the next symbol under the current counts.
    pub fn log2_multiplier(&self, one: bool) -> f64 {
        kt_log2_multiplier(self.get(one), self.total())
    }

    pub fn increment(&mut self, one: bool) {
        if one {
            self.ones += 1;
        } else {
            self.zeros += 1;
        }
    }

    /// Undo one [`increment`](Self::increment).
    ///
    /// # Panics
    ///
    /// Panics if the count for `one` is already zero.
    pub fn decrement(&mut self, one: bool) {
        let slot = if one { &mut self.ones } else { &mut self.zeros };
        assert!(*slot > 0, "KT count underflow: revert without matching update");
        *slot -= 1;
    }

    /// Closed-form block estimate for these counts.
    pub fn log2_block(&self) -> f64 {
        kt_log2_block(self.zeros, self.ones)
    }
}
