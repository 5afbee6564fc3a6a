//! Offline store construction
//!
//! Turns a complaint corpus into a [`ComplaintStore`]: sample the corpus,
//! cut narratives into windows, embed every window, and index the vectors.
//! Arena row `i` and index row `i` describe the same window by construction.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chunk::{ChunkMetadata, WindowChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embed::Embedder;
use crate::index::FlatIndex;
use crate::sample::{stratified_sample, DEFAULT_SAMPLE_SEED, DEFAULT_SAMPLE_SIZE};
use crate::store::ComplaintStore;
use crate::{Chunk, ComplaintRecord, Error, Result};

/// Default number of texts per embedding batch
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Configuration for an index build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub overlap: usize,
    /// Cap on the number of sampled complaint records
    pub sample_size: usize,
    /// Seed for stratified sampling
    pub seed: u64,
    /// Number of texts per embedding batch
    pub embed_batch_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: DEFAULT_SAMPLE_SEED,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }
}

/// Build a complaint store from a corpus.
///
/// Samples the corpus down to `config.sample_size` records, windows each
/// narrative, embeds the windows in batches, and indexes the vectors. The
/// returned store has exactly one index row per arena chunk.
pub fn build_store<E: Embedder>(
    records: &[ComplaintRecord],
    embedder: &E,
    config: &BuildConfig,
) -> Result<ComplaintStore> {
    if config.embed_batch_size == 0 {
        return Err(Error::InvalidConfig(
            "embed_batch_size must be greater than zero".to_string(),
        ));
    }
    let chunker = WindowChunker::new(config.chunk_size, config.overlap)?;

    let sampled = stratified_sample(records, config.sample_size, config.seed);
    info!(
        corpus = records.len(),
        sampled = sampled.len(),
        "sampled complaint corpus"
    );

    let mut chunks: Vec<Chunk> = Vec::new();
    for record in &sampled {
        let metadata = ChunkMetadata::new(&record.complaint_id, &record.category);
        chunks.extend(chunker.chunk_narrative(&record.narrative, &metadata));
    }
    info!(chunks = chunks.len(), "windowed complaint narratives");

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(config.embed_batch_size) {
        let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
        vectors.extend(embedder.embed_batch(&texts)?);
        debug!(embedded = vectors.len(), total = chunks.len(), "embedding progress");
    }

    if vectors.len() != chunks.len() {
        return Err(Error::Embedding(format!(
            "embedder returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    let index = FlatIndex::build(embedder.dimension(), vectors)?;
    info!(
        index_rows = index.len(),
        dimension = index.dimension(),
        model = embedder.model_id(),
        "built complaint store"
    );
    Ok(ComplaintStore::new(index, chunks))
}
