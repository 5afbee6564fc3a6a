//! Store Persistence Example
//!
//! Builds an index, saves its three artifacts to disk, loads them back, and
//! shows that retrieval is unchanged.
//!
//! Run with: cargo run --example persisted_store

use complaint_rag::{
    build::{build_store, BuildConfig},
    embed::{Embedder, HashingEmbedder},
    store::ComplaintStore,
    ComplaintRecord,
};

fn main() -> complaint_rag::Result<()> {
    println!("=== Store Persistence Example ===\n");

    let records = vec![
        ComplaintRecord::new(
            "CMP-2001",
            "Credit card",
            "A recurring subscription kept charging my credit card after I \
             cancelled it in writing.",
        ),
        ComplaintRecord::new(
            "CMP-2002",
            "Money transfer",
            "The transfer app debited my account twice for a single payment \
             and refunded only one of the charges.",
        ),
        ComplaintRecord::new(
            "CMP-2003",
            "Savings account",
            "Interest on my savings account was calculated incorrectly for \
             three consecutive months.",
        ),
    ];

    // 1. Build and save
    let embedder = HashingEmbedder::new(128);
    let store = build_store(&records, &embedder, &BuildConfig::default())?;

    let dir = std::env::temp_dir().join("complaint-rag-demo-store");
    store.save(&dir)?;
    println!("Saved {} windows to {}\n", store.len(), dir.display());

    // 2. Load the artifacts back
    let reloaded = ComplaintStore::load(&dir)?;
    println!("Reloaded {} windows\n", reloaded.len());

    // 3. Search both stores with the same query
    let query = embedder.embed("my account was debited twice for one payment")?;
    let before = store.index().search(&query, 2)?;
    let after = reloaded.index().search(&query, 2)?;

    println!("Top hits before save:");
    for (row, distance) in &before {
        if let Some(chunk) = store.chunk(*row) {
            println!(
                "  [{}] {} (distance {:.3})",
                chunk.metadata.category, chunk.metadata.complaint_id, distance
            );
        }
    }

    assert_eq!(before, after, "reloaded store must rank identically");
    println!("\nReloaded store returned identical rankings.");

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
