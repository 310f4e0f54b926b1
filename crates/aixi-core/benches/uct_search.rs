//! Criterion benchmarks for UCT planning over a learned model.

use aixi_config::AgentParams;
use aixi_core::{search, Agent};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn primed_agent(horizon: u32) -> Agent {
    let params = AgentParams::with_widths(4, 2, 2)
        .with_ct_depth(24)
        .with_horizon(horizon)
        .with_search_timeout_secs(600.0)
        .with_max_simulations(Some(100));
    let mut agent = Agent::new(params, Some(13));
    for i in 0..200u64 {
        agent.model_update_percept(i % 4, (i / 3) % 4);
        agent.model_update_action((i * 7) % 4);
    }
    agent.model_update_percept(0, 1);
    agent
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("uct_search_100_simulations");
    group.sample_size(20);

    for horizon in [4u32, 8, 16] {
        let mut agent = primed_agent(horizon);
        group.bench_with_input(BenchmarkId::from_parameter(horizon), &horizon, |bench, _| {
            bench.iter(|| {
                agent.search_tree_reset();
                search(&mut agent)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
