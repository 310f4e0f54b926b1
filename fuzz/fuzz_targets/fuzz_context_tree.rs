//! Fuzz target for context-tree updates and rollback.
//!
//! Any interleaving of pushes and pops must leave the tree consistent, and
//! popping everything must return it to the empty tree.

#![no_main]

use aixi_common::Symbol;
use aixi_core::predict::ContextTree;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Push(bool),
    Pop,
    Predict(bool),
}

#[derive(Debug, Arbitrary)]
struct Input {
    depth: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let mut tree = ContextTree::new(usize::from(input.depth % 48));
    for op in input.ops.iter().take(512) {
        match op {
            Op::Push(bit) => tree.push_symbol(Symbol::from(*bit)),
            Op::Pop => {
                if tree.history_size() > 0 {
                    tree.pop_symbol();
                }
            }
            Op::Predict(bit) => {
                let p = tree.log_prob_next_symbol(Symbol::from(*bit)).exp2();
                assert!(p > 0.0 && p <= 1.0);
            }
        }
        assert!(tree.log_block_probability() <= 1e-9);
    }

    tree.pop_symbols(tree.history_size());
    assert_eq!(tree.size(), 1);
    assert!(tree.log_block_probability().abs() < 1e-9);
});
