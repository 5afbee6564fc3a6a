//! Stratified sampling of the complaint corpus
//!
//! Bounds indexing cost on large corpora while preserving the per-category
//! mix of complaints. Sampling is seeded, so the same corpus, target, and
//! seed always select the same records.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::ComplaintRecord;

/// Default cap on the number of sampled records
pub const DEFAULT_SAMPLE_SIZE: usize = 12_000;

/// Default sampling seed
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Draw a stratified sample of at most `target` records.
///
/// When the corpus already fits within `target`, all records are returned in
/// corpus order. Otherwise each category contributes
/// `floor(category_len * target / corpus_len)` records drawn without
/// replacement, so the sample mirrors the category proportions of the corpus
/// and never exceeds `target`. Categories whose share floors to zero are
/// excluded. Categories are visited in sorted order, which keeps the output
/// deterministic for a given seed.
#[must_use]
pub fn stratified_sample(
    records: &[ComplaintRecord],
    target: usize,
    seed: u64,
) -> Vec<ComplaintRecord> {
    if records.len() <= target {
        return records.to_vec();
    }

    let fraction = target as f64 / records.len() as f64;

    let mut by_category: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, record) in records.iter().enumerate() {
        by_category
            .entry(record.category.as_str())
            .or_default()
            .push(row);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut sampled = Vec::new();
    for (category, rows) in &by_category {
        let take = (rows.len() as f64 * fraction).floor() as usize;
        if take == 0 {
            debug!(
                category,
                records = rows.len(),
                "category share floors to zero, excluded from sample"
            );
            continue;
        }
        let picks = rand::seq::index::sample(&mut rng, rows.len(), take);
        for pick in picks.iter() {
            sampled.push(records[rows[pick]].clone());
        }
    }

    debug!(
        corpus = records.len(),
        target,
        sampled = sampled.len(),
        "stratified sample drawn"
    );
    sampled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(counts: &[(&str, usize)]) -> Vec<ComplaintRecord> {
        let mut records = Vec::new();
        for (category, count) in counts {
            for i in 0..*count {
                records.push(ComplaintRecord::new(
                    format!("{category}-{i}"),
                    *category,
                    format!("narrative {i} about {category}"),
                ));
            }
        }
        records
    }

    #[test]
    fn test_small_corpus_returned_whole() {
        let records = corpus(&[("Credit card", 3), ("Personal loan", 2)]);
        let sampled = stratified_sample(&records, 100, 42);
        assert_eq!(sampled.len(), records.len());
        assert_eq!(sampled, records);
    }

    #[test]
    fn test_corpus_exactly_at_target_returned_whole() {
        let records = corpus(&[("Credit card", 5)]);
        let sampled = stratified_sample(&records, 5, 42);
        assert_eq!(sampled, records);
    }

    #[test]
    fn test_sample_never_exceeds_target() {
        let records = corpus(&[
            ("Credit card", 70),
            ("Personal loan", 45),
            ("Savings account", 33),
        ]);
        for target in [10, 50, 100, 147] {
            let sampled = stratified_sample(&records, target, 42);
            assert!(sampled.len() <= target, "target {target}");
        }
    }

    #[test]
    fn test_sample_preserves_category_proportions() {
        let records = corpus(&[("Credit card", 600), ("Money transfer", 300)]);
        let sampled = stratified_sample(&records, 300, 42);
        let credit = sampled
            .iter()
            .filter(|r| r.category == "Credit card")
            .count();
        let transfer = sampled
            .iter()
            .filter(|r| r.category == "Money transfer")
            .count();
        // floor(600 * 300/900) = 200, floor(300 * 300/900) = 100
        assert_eq!(credit, 200);
        assert_eq!(transfer, 100);
    }

    #[test]
    fn test_tiny_category_share_floors_to_zero() {
        let records = corpus(&[("Credit card", 998), ("Virtual currency", 2)]);
        let sampled = stratified_sample(&records, 400, 42);
        // floor(2 * 0.4) = 0, the tiny category drops out
        assert!(sampled.iter().all(|r| r.category == "Credit card"));
        assert_eq!(sampled.len(), 399);
    }

    #[test]
    fn test_same_seed_reproduces_sample() {
        let records = corpus(&[("Credit card", 120), ("Personal loan", 80)]);
        let first = stratified_sample(&records, 60, 7);
        let second = stratified_sample(&records, 60, 7);
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_can_differ() {
        let records = corpus(&[("Credit card", 500)]);
        let first = stratified_sample(&records, 50, 1);
        let second = stratified_sample(&records, 50, 2);
        assert_eq!(first.len(), second.len());
        assert_ne!(first, second);
    }

    #[test]
    fn test_sampled_records_come_from_corpus() {
        let records = corpus(&[("Credit card", 90), ("Savings account", 60)]);
        let sampled = stratified_sample(&records, 75, 42);
        for record in &sampled {
            assert!(records.contains(record));
        }
    }

    #[test]
    fn test_sample_draws_without_replacement() {
        let records = corpus(&[("Credit card", 200)]);
        let sampled = stratified_sample(&records, 150, 42);
        let mut ids: Vec<&str> = sampled.iter().map(|r| r.complaint_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), sampled.len());
    }
}
