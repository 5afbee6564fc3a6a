//! Complaint-RAG: Retrieval-Augmented Answering over Customer Complaints
//!
//! This crate turns a corpus of customer complaint narratives into an
//! evidence-backed question answering pipeline. The offline half samples the
//! corpus, windows each narrative, embeds the windows, and persists a flat
//! vector index next to the chunk arena. The online half embeds a question,
//! retrieves the nearest complaint excerpts, and asks a generation backend
//! to synthesize an answer grounded in them.
//!
//! # Quick Start
//!
//! ```rust
//! use complaint_rag::{
//!     build::{build_store, BuildConfig},
//!     embed::HashingEmbedder,
//!     generate::StubGenerator,
//!     pipeline::PipelineBuilder,
//!     ComplaintRecord,
//! };
//!
//! let records = vec![
//!     ComplaintRecord::new(
//!         "CMP-1001",
//!         "Credit card",
//!         "Unauthorized charges appeared on my statement two months in a row.",
//!     ),
//!     ComplaintRecord::new(
//!         "CMP-1002",
//!         "Savings account",
//!         "The bank froze my savings account without notice.",
//!     ),
//! ];
//!
//! // Offline: build the store.
//! let embedder = HashingEmbedder::new(64);
//! let store = build_store(&records, &embedder, &BuildConfig::default()).unwrap();
//!
//! // Online: answer questions against it.
//! let pipeline = PipelineBuilder::new()
//!     .store(store)
//!     .embedder(embedder)
//!     .generator(StubGenerator::new("Customers report unauthorized charges."))
//!     .build()
//!     .unwrap();
//!
//! let answer = pipeline
//!     .answer_question("What happened with credit cards?", 2)
//!     .unwrap();
//! assert!(!answer.retrieved_sources.is_empty());
//! assert_eq!(answer.answer, "Customers report unauthorized charges.");
//! ```
//!
//! # Generation Backends
//!
//! - [`OllamaGenerator`] - local Ollama server over HTTP
//! - [`StubGenerator`] - deterministic in-process double for tests and demos
//!
//! Generation failures degrade: the pipeline returns the fallback answer
//! with the retrieved sources intact. Retrieval failures are hard errors.
//!
//! # Example: Windowing a Narrative
//!
//! ```rust
//! use complaint_rag::chunk::WindowChunker;
//!
//! let chunker = WindowChunker::new(10, 2).unwrap();
//! let windows = chunker.chunk("abcdefghijklmno");
//! assert_eq!(windows.len(), 2);
//! assert_eq!(windows[1], "ijklmno");
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unnecessary_literal_bound)]
#![allow(clippy::cloned_instead_of_copied)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::manual_div_ceil)]
#![allow(clippy::unnecessary_map_or)]
#![allow(clippy::derivable_impls)]

pub mod build;
pub mod chunk;
pub mod corpus;
pub mod embed;
pub mod error;
pub mod generate;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod retrieve;
pub mod sample;
pub mod store;

pub use build::{build_store, BuildConfig};
pub use chunk::{Chunk, ChunkMetadata, WindowChunker};
pub use corpus::load_records;
pub use embed::{Embedder, HashingEmbedder};
#[cfg(feature = "embeddings")]
pub use embed::{EmbeddingModelType, FastEmbedder};
pub use error::{Error, Result};
pub use generate::{
    GenerationOptions, Generator, OllamaGenerator, StubGenerator, GENERATION_ERROR_ANSWER,
};
pub use index::FlatIndex;
pub use pipeline::{Answer, ComplaintPipeline, PipelineBuilder};
pub use prompt::build_prompt;
pub use retrieve::{RetrievedSource, Retriever, DEFAULT_TOP_K};
pub use sample::stratified_sample;
pub use store::{ComplaintStore, Compression};

/// One consumer complaint: an identifier, a product category, and the
/// narrative text filed by the customer.
///
/// Records arrive pre-filtered: the narrative is expected to be non-empty
/// and the category normalized upstream.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ComplaintRecord {
    /// Complaint identifier as assigned by the intake system
    pub complaint_id: String,
    /// Product category the complaint was filed under
    pub category: String,
    /// Free-text complaint narrative
    pub narrative: String,
}

impl ComplaintRecord {
    /// Create a new complaint record
    #[must_use]
    pub fn new(
        complaint_id: impl Into<String>,
        category: impl Into<String>,
        narrative: impl Into<String>,
    ) -> Self {
        Self {
            complaint_id: complaint_id.into(),
            category: category.into(),
            narrative: narrative.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complaint_record_new() {
        let record = ComplaintRecord::new("CMP-42", "Credit card", "the card never arrived");
        assert_eq!(record.complaint_id, "CMP-42");
        assert_eq!(record.category, "Credit card");
        assert_eq!(record.narrative, "the card never arrived");
    }

    #[test]
    fn test_complaint_record_parses_corpus_line() {
        let line = r#"{"complaint_id": "CMP-7", "category": "Money transfer", "narrative": "funds held for a month"}"#;
        let record: ComplaintRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.complaint_id, "CMP-7");
        assert_eq!(record.category, "Money transfer");
    }

    #[test]
    fn test_complaint_record_serde_roundtrip() {
        let record = ComplaintRecord::new("CMP-8", "Personal loan", "rate changed overnight");
        let json = serde_json::to_string(&record).unwrap();
        let restored: ComplaintRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }
}
