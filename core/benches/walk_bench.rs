use criterion::{criterion_group, criterion_main, Criterion};
use ir_core::pagerank::{ExactSolver, MonteCarlo, WalkStrategy};
use ir_core::{LinkGraph, OracleConfig, WalkConfig};

fn ring_with_chords(n: usize) -> LinkGraph {
    let mut text = String::new();
    for i in 0..n {
        text.push_str(&format!("{i};{},{}\n", (i + 1) % n, (i * 7 + 3) % n));
    }
    LinkGraph::parse_str(&text, n + 1)
}

fn bench_walks(c: &mut Criterion) {
    let graph = ring_with_chords(2_000);
    let mc = MonteCarlo::new(&graph, WalkConfig::default());
    c.bench_function("endpoint_random_100k", |b| b.iter(|| mc.estimate(WalkStrategy::EndpointRandomStart { walks: 100_000 })));
    c.bench_function("complete_path_random_10k_t100", |b| {
        b.iter(|| mc.estimate(WalkStrategy::CompletePathRandomStart { walks: 10_000, horizon: 100 }))
    });

    let small = ring_with_chords(300);
    c.bench_function("exact_300", |b| b.iter(|| ExactSolver::new(&small, OracleConfig::default()).solve()));
}

criterion_group!(benches, bench_walks);
criterion_main!(benches);
