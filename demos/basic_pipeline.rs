//! Basic Complaint Pipeline Example
//!
//! Run with: cargo run --example basic_pipeline

use complaint_rag::{
    build::{build_store, BuildConfig},
    embed::HashingEmbedder,
    generate::StubGenerator,
    pipeline::PipelineBuilder,
    ComplaintRecord,
};

fn main() -> complaint_rag::Result<()> {
    println!("=== Basic Complaint Pipeline Example ===\n");

    // 1. Prepare a small complaint corpus
    let records = vec![
        ComplaintRecord::new(
            "CMP-1001",
            "Credit card",
            "Unauthorized charges appeared on my credit card statement \
             and the dispute process dragged on for two months without \
             any resolution from the bank.",
        ),
        ComplaintRecord::new(
            "CMP-1002",
            "Personal loan",
            "The interest rate on my personal loan was raised overnight \
             without notice, and customer service could not explain why.",
        ),
        ComplaintRecord::new(
            "CMP-1003",
            "Money transfer",
            "My international money transfer was delayed for ten days and \
             the tracking page showed no updates the whole time.",
        ),
        ComplaintRecord::new(
            "CMP-1004",
            "Savings account",
            "The bank froze my savings account without warning after a \
             routine deposit and demanded documents I had already sent.",
        ),
    ];

    // 2. Build the store: sample, window, embed, index
    let embedder = HashingEmbedder::new(256);
    let store = build_store(&records, &embedder, &BuildConfig::default())?;
    println!("Indexed {} complaint windows\n", store.len());

    // 3. Assemble the pipeline with an offline generator
    let pipeline = PipelineBuilder::new()
        .store(store)
        .embedder(embedder)
        .generator(StubGenerator::new(
            "Customers most often describe unresolved disputes and \
             unexplained account actions.",
        ))
        .build()?;

    // 4. Ask questions
    let questions = [
        "Why are customers unhappy with credit cards?",
        "Are there delays in money transfers?",
    ];

    for question in questions {
        let answer = pipeline.answer_question(question, 2)?;

        println!("Question: {}\n", answer.question);
        println!("Answer: {}\n", answer.answer);
        println!("Sources:");
        for (i, source) in answer.retrieved_sources.iter().enumerate() {
            println!(
                "  {}. [{}] complaint {} (distance {:.3})",
                i + 1,
                source.metadata.category,
                source.metadata.complaint_id,
                source.distance
            );
        }
        println!("\n{}\n", "=".repeat(60));
    }

    Ok(())
}
