//! Property-based tests for complaint-rag

use std::collections::HashSet;

use complaint_rag::{
    chunk::WindowChunker,
    embed::{Embedder, HashingEmbedder},
    index::{squared_euclidean, FlatIndex},
    sample::stratified_sample,
    ComplaintRecord,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_window_chunker_covers_text(
        content in "[a-zA-Z ]{100,1000}",
        chunk_size in 50usize..200,
        overlap in 0usize..50
    ) {
        let chunker = WindowChunker::new(chunk_size, overlap).expect("valid window config");
        let windows = chunker.chunk(&content);

        let chars: Vec<char> = content.chars().collect();
        let step = chunk_size - overlap;
        let expected = (chars.len() - 1) / step + 1;
        prop_assert_eq!(windows.len(), expected);

        // Each window is exactly the slice starting at its stride offset.
        for (i, window) in windows.iter().enumerate() {
            let start = i * step;
            let end = (start + chunk_size).min(chars.len());
            let slice: String = chars[start..end].iter().collect();
            prop_assert_eq!(window, &slice);
            prop_assert!(window.chars().count() <= chunk_size);
        }
    }

    #[test]
    fn prop_zero_overlap_partitions_text(
        content in "[a-zA-Z ]{1,500}",
        chunk_size in 10usize..100
    ) {
        let chunker = WindowChunker::new(chunk_size, 0).expect("valid window config");
        let windows = chunker.chunk(&content);
        let rebuilt: String = windows.concat();
        prop_assert_eq!(rebuilt, content);
    }

    #[test]
    fn prop_sampler_caps_subsets_and_repeats(
        sizes in prop::collection::vec(1usize..40, 1..5),
        target in 1usize..80,
        seed in any::<u64>()
    ) {
        let mut records = Vec::new();
        for (group, count) in sizes.iter().enumerate() {
            for item in 0..*count {
                records.push(ComplaintRecord::new(
                    format!("CMP-{group}-{item}"),
                    format!("category-{group}"),
                    "narrative text",
                ));
            }
        }

        let sampled = stratified_sample(&records, target, seed);
        if records.len() <= target {
            prop_assert_eq!(sampled.len(), records.len());
        } else {
            prop_assert!(sampled.len() <= target);
        }

        let corpus_ids: HashSet<&str> =
            records.iter().map(|r| r.complaint_id.as_str()).collect();
        let sampled_ids: HashSet<&str> =
            sampled.iter().map(|r| r.complaint_id.as_str()).collect();
        prop_assert_eq!(sampled_ids.len(), sampled.len(), "sample must not repeat records");
        prop_assert!(sampled_ids.is_subset(&corpus_ids));

        let again = stratified_sample(&records, target, seed);
        prop_assert_eq!(sampled, again);
    }

    #[test]
    fn prop_search_results_bounded_and_sorted(
        vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 8), 1..30),
        query in prop::collection::vec(-1.0f32..1.0, 8),
        k in 0usize..40
    ) {
        let total = vectors.len();
        let index = FlatIndex::build(8, vectors).expect("valid vectors");
        let hits = index.search(&query, k).expect("search failed");

        prop_assert_eq!(hits.len(), k.min(total));
        let rows: HashSet<usize> = hits.iter().map(|(row, _)| *row).collect();
        prop_assert_eq!(rows.len(), hits.len(), "rows must be distinct");
        for (row, _) in &hits {
            prop_assert!(*row < total);
        }
        for pair in hits.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].1, "distances must be ascending");
        }
    }

    #[test]
    fn prop_embeddings_normalized_and_deterministic(
        text in "[a-zA-Z ]{1,200}",
        dimension in 8usize..256
    ) {
        let embedder = HashingEmbedder::new(dimension);

        if let Ok(embedding) = embedder.embed(&text) {
            prop_assert_eq!(embedding.len(), dimension);
            let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
            prop_assert!((norm - 1.0).abs() < 1e-3, "norm was {}", norm);

            let again = embedder.embed(&text).expect("embed failed on retry");
            prop_assert_eq!(embedding, again);
        }
    }

    #[test]
    fn prop_squared_euclidean_identity_and_symmetry(
        a in prop::collection::vec(-1.0f32..1.0, 16),
        b in prop::collection::vec(-1.0f32..1.0, 16)
    ) {
        prop_assert!(squared_euclidean(&a, &a).abs() < 1e-6);
        let forward = squared_euclidean(&a, &b);
        let backward = squared_euclidean(&b, &a);
        prop_assert!((forward - backward).abs() < 1e-4);
        prop_assert!(forward >= 0.0);
    }
}

#[test]
fn test_window_count_for_known_text() {
    let chunker = WindowChunker::new(100, 10).unwrap();
    let text = "Test content. ".repeat(50);
    let windows = chunker.chunk(&text);

    // 700 characters with a stride of 90 puts the last window start at 630.
    assert_eq!(windows.len(), 8);
    assert_eq!(windows.last().unwrap().chars().count(), 70);
}
