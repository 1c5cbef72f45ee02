//! Benchmarks for path search and greedy embedding.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use lembed::prelude::*;

fn sphere_tetrahedron(level: usize) -> Embedding {
    let target: HalfEdgeMesh = primitives::icosphere(level);
    let corners = [0, 4, 2, 1].map(|i| *target.position(VertexId::new(i)));
    let layout = primitives::tetrahedron_layout(corners);
    let landmarks = match_by_proximity(&layout, &target).unwrap();
    Embedding::new(EmbeddingInput::new(layout, target, landmarks).unwrap()).unwrap()
}

fn bench_search(c: &mut Criterion) {
    let em = sphere_tetrahedron(4);
    let l_he = em.layout().halfedge_ids().next().unwrap();

    c.bench_function("shortest_path_icosphere4", |b| {
        b.iter(|| em.find_shortest_path(l_he, ShortestPathMetric::Geodesic))
    });

    c.bench_function("shortest_path_repulsive_icosphere4", |b| {
        b.iter(|| em.find_shortest_path(l_he, ShortestPathMetric::VertexRepulsive))
    });
}

fn bench_greedy(c: &mut Criterion) {
    let em = sphere_tetrahedron(3);

    c.bench_function("greedy_icosphere3", |b| {
        b.iter_batched(
            || em.clone(),
            |mut em| embed_greedy(&mut em, &GreedySettings::default()).unwrap(),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("greedy_praun_icosphere3", |b| {
        b.iter_batched(
            || em.clone(),
            |mut em| embed_greedy(&mut em, &GreedySettings::praun()).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_search, bench_greedy);
criterion_main!(benches);
