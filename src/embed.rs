//! Embedding generation for complaint narratives and questions

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
#[cfg(feature = "embeddings")]
use std::sync::Mutex;

use crate::{Error, Result};

/// Trait for mapping text to fixed-dimension dense vectors.
///
/// Batch embedding is order-preserving: the output holds exactly one vector
/// per input text, in input order. Both corpus chunks and questions go
/// through the same embedder so their vectors share a space.
pub trait Embedder: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Batch embed multiple texts, one vector per input in input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Get model identifier
    fn model_id(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Deterministic bag-of-words embedder.
///
/// Tokens are lowercased, hashed into `dimension` buckets, counted, and the
/// resulting vector is L2-normalized. Texts sharing tokens land near each
/// other under Euclidean distance, so retrieval over hashed vectors tracks
/// lexical overlap. No model download, no I/O, and identical output for
/// identical input, which makes this the default for offline index builds
/// and the test double for [`FastEmbedder`].
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    /// Create a hashing embedder with the given dimension
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: "hashing-bow".to_string(),
        }
    }

    /// Set the model identifier
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    fn token_vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        normalize(&mut vector);
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::Embedding("cannot embed empty text".to_string()));
        }
        Ok(self.token_vector(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Normalize a vector to unit length in place (zero vectors are left as-is)
fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Sentence-transformer models available behind the `embeddings` feature
#[cfg(feature = "embeddings")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingModelType {
    /// all-MiniLM-L6-v2: 384 dimensions, fast, good general-purpose retrieval
    AllMiniLmL6V2,
    /// all-MiniLM-L12-v2: 384 dimensions, slower, slightly better quality
    AllMiniLmL12V2,
}

#[cfg(feature = "embeddings")]
impl EmbeddingModelType {
    /// Convert to fastembed model enum
    fn to_fastembed_model(self) -> fastembed::EmbeddingModel {
        match self {
            Self::AllMiniLmL6V2 => fastembed::EmbeddingModel::AllMiniLML6V2,
            Self::AllMiniLmL12V2 => fastembed::EmbeddingModel::AllMiniLML12V2,
        }
    }

    /// Get embedding dimension for this model
    #[must_use]
    pub fn dimension(self) -> usize {
        match self {
            Self::AllMiniLmL6V2 | Self::AllMiniLmL12V2 => 384,
        }
    }

    /// Get the model identifier string
    #[must_use]
    pub fn model_name(self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::AllMiniLmL12V2 => "sentence-transformers/all-MiniLM-L12-v2",
        }
    }
}

#[cfg(feature = "embeddings")]
impl Default for EmbeddingModelType {
    fn default() -> Self {
        Self::AllMiniLmL6V2
    }
}

/// Production embedder backed by fastembed sentence-transformer models.
///
/// Downloads model weights on first use and runs inference locally via ONNX
/// Runtime. Available behind the `embeddings` feature.
#[cfg(feature = "embeddings")]
pub struct FastEmbedder {
    // fastembed's embed() needs &mut, the Embedder trait hands out &self
    model: Mutex<fastembed::TextEmbedding>,
    model_type: EmbeddingModelType,
}

#[cfg(feature = "embeddings")]
impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_type", &self.model_type)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "embeddings")]
impl FastEmbedder {
    /// Create a new embedder with the specified model.
    ///
    /// Downloads the model on first use (cached locally afterwards).
    pub fn new(model_type: EmbeddingModelType) -> Result<Self> {
        let options = fastembed::InitOptions::new(model_type.to_fastembed_model())
            .with_show_download_progress(true);

        let model = fastembed::TextEmbedding::try_new(options).map_err(|e| {
            Error::ModelLoad(format!(
                "failed to initialize {}: {e}",
                model_type.model_name()
            ))
        })?;

        Ok(Self {
            model: Mutex::new(model),
            model_type,
        })
    }

    /// Create an embedder with the default model (all-MiniLM-L6-v2)
    pub fn default_model() -> Result<Self> {
        Self::new(EmbeddingModelType::default())
    }

    /// Get the model type
    #[must_use]
    pub fn model_type(&self) -> EmbeddingModelType {
        self.model_type
    }
}

#[cfg(feature = "embeddings")]
impl Embedder for FastEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::Embedding("cannot embed empty text".to_string()));
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::Embedding("embedding model lock poisoned".to_string()))?;
        let mut embeddings = model
            .embed(vec![text], None)
            .map_err(|e| Error::Embedding(format!("embedding failed: {e}")))?;

        embeddings
            .pop()
            .ok_or_else(|| Error::Embedding("model returned no embedding".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|text| text.trim().is_empty()) {
            return Err(Error::Embedding("cannot embed empty text".to_string()));
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::Embedding("embedding model lock poisoned".to_string()))?;
        let embeddings = model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Embedding(format!("batch embedding failed: {e}")))?;

        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.model_type.dimension()
    }

    fn model_id(&self) -> &str {
        self.model_type.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::squared_euclidean;

    // ============================================================
    // HashingEmbedder Tests
    // ============================================================

    #[test]
    fn test_hashing_embedder_dimension() {
        let embedder = HashingEmbedder::new(64);
        assert_eq!(embedder.dimension(), 64);
        let vector = embedder.embed("credit card dispute").unwrap();
        assert_eq!(vector.len(), 64);
    }

    #[test]
    fn test_hashing_embedder_deterministic() {
        let embedder = HashingEmbedder::new(64);
        let first = embedder.embed("unauthorized charges on my card").unwrap();
        let second = embedder.embed("unauthorized charges on my card").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_hashing_embedder_normalized() {
        let embedder = HashingEmbedder::new(64);
        let vector = embedder.embed("the loan interest rate changed").unwrap();
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_case_insensitive_tokens() {
        let embedder = HashingEmbedder::new(64);
        let lower = embedder.embed("credit card").unwrap();
        let upper = embedder.embed("CREDIT CARD").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_hashing_embedder_rejects_empty_text() {
        let embedder = HashingEmbedder::new(64);
        assert!(embedder.embed("").is_err());
        assert!(embedder.embed("   ").is_err());
    }

    #[test]
    fn test_hashing_embedder_batch_preserves_order() {
        let embedder = HashingEmbedder::new(32);
        let texts = ["alpha complaint", "beta complaint", "gamma complaint"];
        let batch = embedder.embed_batch(&texts).unwrap();
        assert_eq!(batch.len(), 3);
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(vector, &embedder.embed(text).unwrap());
        }
    }

    #[test]
    fn test_hashing_embedder_batch_fails_on_empty_member() {
        let embedder = HashingEmbedder::new(32);
        let result = embedder.embed_batch(&["fine", ""]);
        assert!(result.is_err());
    }

    #[test]
    fn test_token_overlap_beats_disjoint_text() {
        let embedder = HashingEmbedder::new(128);
        let query = embedder.embed("credit card fraud charges").unwrap();
        let overlapping = embedder
            .embed("fraud charges appeared on my credit card")
            .unwrap();
        let disjoint = embedder
            .embed("savings deposit was frozen yesterday")
            .unwrap();
        let near = squared_euclidean(&query, &overlapping);
        let far = squared_euclidean(&query, &disjoint);
        assert!(near < far);
    }

    #[test]
    fn test_with_model_id() {
        let embedder = HashingEmbedder::new(16).with_model_id("hash-test");
        assert_eq!(embedder.model_id(), "hash-test");
    }

    // ============================================================
    // EmbeddingModelType Tests (feature-gated)
    // ============================================================

    #[cfg(feature = "embeddings")]
    #[test]
    fn test_model_type_dimensions() {
        assert_eq!(EmbeddingModelType::AllMiniLmL6V2.dimension(), 384);
        assert_eq!(EmbeddingModelType::AllMiniLmL12V2.dimension(), 384);
    }

    #[cfg(feature = "embeddings")]
    #[test]
    fn test_model_type_names() {
        assert_eq!(
            EmbeddingModelType::AllMiniLmL6V2.model_name(),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
        assert_eq!(
            EmbeddingModelType::default(),
            EmbeddingModelType::AllMiniLmL6V2
        );
    }
}
