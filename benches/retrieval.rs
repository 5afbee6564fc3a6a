//! Benchmarks for retrieval operations

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use complaint_rag::{
    build::{build_store, BuildConfig},
    chunk::WindowChunker,
    embed::{Embedder, HashingEmbedder},
    index::FlatIndex,
    retrieve::Retriever,
    ComplaintRecord,
};

const CATEGORIES: [&str; 4] = [
    "Credit card",
    "Personal loan",
    "Money transfer",
    "Savings account",
];

fn synthetic_records(count: usize) -> Vec<ComplaintRecord> {
    (0..count)
        .map(|i| {
            ComplaintRecord::new(
                format!("CMP-{i}"),
                CATEGORIES[i % CATEGORIES.len()],
                format!(
                    "Complaint {i} about unexpected fees, repeated support calls, and a \
                     dispute on my account that took weeks to resolve"
                ),
            )
        })
        .collect()
}

fn bench_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");

    let narrative = "Lorem ipsum dolor sit amet. ".repeat(1000);
    let chunker = WindowChunker::new(500, 50).unwrap();

    group.bench_function("chunk_large_narrative", |b| {
        b.iter(|| chunker.chunk(black_box(&narrative)));
    });

    group.finish();
}

fn bench_embedding(c: &mut Criterion) {
    let mut group = c.benchmark_group("embedding");

    let embedder = HashingEmbedder::new(384);
    let texts: Vec<&str> = (0..100)
        .map(|_| "This complaint describes an unauthorized charge on a credit card")
        .collect();

    group.bench_function("embed_100_texts", |b| {
        b.iter(|| embedder.embed_batch(black_box(&texts)));
    });

    group.finish();
}

fn bench_flat_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_search");

    let vectors: Vec<Vec<f32>> = (0..1000)
        .map(|i| {
            let mut v = vec![0.0f32; 128];
            v[i % 128] = 1.0;
            v
        })
        .collect();
    let index = FlatIndex::build(128, vectors).unwrap();
    let query = vec![1.0f32; 128];

    group.bench_function("search_top_5", |b| {
        b.iter(|| index.search(black_box(&query), 5));
    });

    group.bench_function("search_top_50", |b| {
        b.iter(|| index.search(black_box(&query), 50));
    });

    group.finish();
}

fn bench_retrieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("retrieve");

    let embedder = HashingEmbedder::new(128);
    let store = build_store(&synthetic_records(500), &embedder, &BuildConfig::default()).unwrap();
    let retriever = Retriever::new(store, embedder).unwrap();

    group.bench_function("retrieve_top_5", |b| {
        b.iter(|| retriever.retrieve(black_box("why was my dispute not resolved"), 5));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_chunking,
    bench_embedding,
    bench_flat_search,
    bench_retrieve,
);

criterion_main!(benches);
