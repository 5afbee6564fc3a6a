//! Semantic retrieval over the complaint store

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunk::ChunkMetadata;
use crate::embed::Embedder;
use crate::store::ComplaintStore;
use crate::{Error, Result};

/// Default number of sources retrieved per question
pub const DEFAULT_TOP_K: usize = 5;

/// One retrieved source: a chunk with its provenance and distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedSource {
    /// The chunk text
    pub text: String,
    /// Provenance of the chunk
    pub metadata: ChunkMetadata,
    /// Squared Euclidean distance from the question (smaller is closer)
    pub distance: f32,
}

/// Retrieves the chunks most semantically similar to a question.
///
/// The retriever owns the store and borrows the embedder that built it; a
/// question embedded with a different model would search a foreign vector
/// space, so the embedder dimension is checked against the index up front.
#[derive(Debug)]
pub struct Retriever<E: Embedder> {
    store: ComplaintStore,
    embedder: E,
}

impl<E: Embedder> Retriever<E> {
    /// Create a retriever over a store.
    ///
    /// Fails if the embedder dimension does not match the index dimension.
    pub fn new(store: ComplaintStore, embedder: E) -> Result<Self> {
        if embedder.dimension() != store.index().dimension() {
            return Err(Error::DimensionMismatch {
                expected: store.index().dimension(),
                actual: embedder.dimension(),
            });
        }
        Ok(Self { store, embedder })
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &ComplaintStore {
        &self.store
    }

    /// The embedder used for questions
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Retrieve the `top_k` chunks closest to `question`.
    ///
    /// Results are ordered by ascending distance. Fewer than `top_k` sources
    /// come back when the store is smaller than `top_k` or when index rows
    /// have no arena counterpart (those rows are skipped with a warning).
    pub fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedSource>> {
        if top_k == 0 {
            return Err(Error::InvalidConfig(
                "top_k must be greater than zero".to_string(),
            ));
        }

        let query = self.embedder.embed(question)?;
        let hits = self.store.index().search(&query, top_k)?;

        let mut sources = Vec::with_capacity(hits.len());
        for (row, distance) in hits {
            match self.store.chunk(row) {
                Some(chunk) => sources.push(RetrievedSource {
                    text: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    distance,
                }),
                None => {
                    warn!(row, "index row has no chunk in the arena, skipping");
                }
            }
        }

        debug!(
            question_chars = question.chars().count(),
            requested = top_k,
            retrieved = sources.len(),
            "retrieved sources"
        );
        Ok(sources)
    }

    /// Retrieve, wrapping any failure with the question being answered
    pub fn retrieve_for_question(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedSource>> {
        self.retrieve(question, top_k)
            .map_err(|e| Error::retrieval(question, e))
    }
}
