//! Benchmarks for brute-force KNN search.
//!
//! Uses 10,000 songs of dimension 12 by default. Set `BENCH_FULL_SCALE=1`
//! to run against 100,000 songs:
//!
//! ```bash
//! BENCH_FULL_SCALE=1 cargo bench -p cadence-vector
//! ```

use std::collections::HashMap;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cadence_vector::{KeyValueFilter, SearchParams, VectorStore};

const DIM: usize = 12;
const CI_SONG_COUNT: usize = 10_000;
const FULL_SCALE_SONG_COUNT: usize = 100_000;

const GENRES: [&str; 4] = ["rock", "jazz", "pop", "ambient"];

fn song_count() -> usize {
    if std::env::var("BENCH_FULL_SCALE").is_ok() {
        FULL_SCALE_SONG_COUNT
    } else {
        CI_SONG_COUNT
    }
}

/// Deterministic pseudo-random embedding for song `i`.
fn embedding_for(i: usize) -> Vec<f32> {
    let mut state = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..DIM)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        })
        .collect()
}

fn build_populated_store(count: usize) -> VectorStore {
    let store = VectorStore::new(DIM);
    for i in 0..count {
        let metadata = HashMap::from([("genre".to_string(), GENRES[i % GENRES.len()].to_string())]);
        store
            .insert_with_id(format!("track-{i}"), embedding_for(i), Some(metadata))
            .expect("benchmark embedding has the store dimension");
    }
    store
}

fn bench_search(c: &mut Criterion) {
    let store = build_populated_store(song_count());
    let query = embedding_for(usize::MAX / 2);

    let mut group = c.benchmark_group("vector_search");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("knn_k10", |b| {
        b.iter(|| {
            let results = store
                .search(SearchParams::new(black_box(&query)).with_k(10))
                .expect("query has the store dimension");
            black_box(results);
        })
    });

    let filter = KeyValueFilter::default().with("genre", "jazz");
    group.bench_function("knn_k10_filtered", |b| {
        b.iter(|| {
            let results = store
                .search(
                    SearchParams::new(black_box(&query))
                        .with_k(10)
                        .with_filter(&filter),
                )
                .expect("query has the store dimension");
            black_box(results);
        })
    });

    group.bench_function("search_by_id_k10", |b| {
        b.iter(|| {
            let results = store
                .search_by_id(black_box("track-42"), 10, None)
                .expect("stored embedding has the store dimension");
            black_box(results);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
