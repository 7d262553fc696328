//! Benchmarks for `retrieval::retrieve` (spec.md §4.C4): the cosine +
//! concept-boost ranking pass run against short-term on every `ask`.
//!
//! Run with: `cargo bench --bench retrieval_benchmark`

use std::collections::BTreeSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memory_core::retrieval::retrieve;
use memory_core::types::Interaction;

const DIMENSION: usize = 1536;

fn make_embedding(seed: u64) -> Vec<f32> {
    (0..DIMENSION)
        .map(|i| (((seed.wrapping_mul(2654435761).wrapping_add(i as u64)) % 1000) as f32 / 1000.0) - 0.5)
        .collect()
}

fn make_candidates(count: usize) -> Vec<Interaction> {
    (0..count)
        .map(|i| {
            let mut concepts = BTreeSet::new();
            if i % 3 == 0 {
                concepts.insert("turquoise".to_string());
            }
            Interaction::new(
                format!("interaction-{i}"),
                format!("prompt {i}"),
                format!("output {i}"),
                make_embedding(i as u64),
                concepts,
                i as i64 * 1000,
            )
        })
        .collect()
}

fn bench_retrieve(c: &mut Criterion) {
    let query = make_embedding(42);
    let query_concepts = vec!["turquoise".to_string()];

    let mut group = c.benchmark_group("retrieve");
    for size in [50usize, 200, 1000] {
        let candidates = make_candidates(size);
        group.bench_function(format!("short_term_cap_{size}"), |b| {
            b.iter(|| {
                black_box(retrieve(
                    black_box(&query),
                    black_box(&query_concepts),
                    black_box(&candidates),
                    40.0,
                    10,
                    10.0,
                ))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_retrieve);
criterion_main!(benches);
