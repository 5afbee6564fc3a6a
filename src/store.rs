//! Persistence for the complaint store
//!
//! A built store is three artifacts in one directory: the vector index, the
//! chunk metadata, and the chunk texts. Each artifact is bincode wrapped in
//! LZ4; the on-disk layout is fixed, with no format negotiation on load.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use crate::chunk::{Chunk, ChunkMetadata};
use crate::index::FlatIndex;
use crate::{Error, Result};

/// File name of the serialized vector index
pub const INDEX_FILE: &str = "index.bin";

/// File name of the serialized chunk metadata
pub const METADATA_FILE: &str = "metadata.bin";

/// File name of the serialized chunk texts
pub const CHUNKS_FILE: &str = "chunks.bin";

/// Compression codec used on store artifacts
const ARTIFACT_COMPRESSION: Compression = Compression::Lz4;

/// Compression algorithm for artifact serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// LZ4: fast compression, good for frequent rebuilds (default)
    #[default]
    Lz4,
    /// ZSTD: better ratio, slower
    Zstd,
}

impl Compression {
    /// Get algorithm name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    /// Compress data using this algorithm
    ///
    /// # Errors
    /// Returns error if compression fails (e.g., ZSTD internal error)
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            Self::Zstd => zstd::encode_all(data, 3)
                .map_err(|e| Error::SerializationError(format!("ZSTD compression failed: {e}"))),
        }
    }

    /// Decompress data using this algorithm
    ///
    /// # Errors
    /// Returns error if decompression fails (e.g., corrupted data)
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Self::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| Error::SerializationError(format!("LZ4 decompression failed: {e}"))),
            Self::Zstd => zstd::decode_all(data)
                .map_err(|e| Error::SerializationError(format!("ZSTD decompression failed: {e}"))),
        }
    }
}

/// Serialize a value to compressed bytes
///
/// # Errors
/// Returns error if serialization or compression fails
pub fn serialize_compressed<T: Serialize>(value: &T, compression: Compression) -> Result<Vec<u8>> {
    let bytes = bincode::serialize(value)
        .map_err(|e| Error::SerializationError(format!("Bincode serialization failed: {e}")))?;
    compression.compress(&bytes)
}

/// Deserialize a value from compressed bytes
///
/// # Errors
/// Returns error if decompression or deserialization fails
pub fn deserialize_compressed<T: DeserializeOwned>(
    data: &[u8],
    compression: Compression,
) -> Result<T> {
    let decompressed = compression.decompress(data)?;
    bincode::deserialize(&decompressed)
        .map_err(|e| Error::SerializationError(format!("Bincode deserialization failed: {e}")))
}

/// The retrieval state: vector index plus the chunk arena it points into.
///
/// Row `i` of the index corresponds to `chunks[i]`. If the two lengths ever
/// diverge (e.g., artifacts regenerated out of step), lookups past the arena
/// end return `None` and retrieval skips those rows.
#[derive(Debug, Clone)]
pub struct ComplaintStore {
    index: FlatIndex,
    chunks: Vec<Chunk>,
}

impl ComplaintStore {
    /// Assemble a store from an index and the chunk arena it addresses.
    ///
    /// A length mismatch between the two is logged but tolerated; rows
    /// without a chunk are skipped during retrieval.
    #[must_use]
    pub fn new(index: FlatIndex, chunks: Vec<Chunk>) -> Self {
        if index.len() != chunks.len() {
            warn!(
                index_rows = index.len(),
                chunks = chunks.len(),
                "vector index and chunk arena differ in length; unmatched rows will be skipped"
            );
        }
        Self { index, chunks }
    }

    /// The vector index
    #[must_use]
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// The chunk arena
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Look up the chunk at an index row
    #[must_use]
    pub fn chunk(&self, row: usize) -> Option<&Chunk> {
        self.chunks.get(row)
    }

    /// Number of chunks in the arena
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if the arena is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Write the three store artifacts into `dir`, creating it if needed.
    ///
    /// Overwrites artifacts already present.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let texts: Vec<&str> = self.chunks.iter().map(|c| c.text.as_str()).collect();
        let metadata: Vec<&ChunkMetadata> = self.chunks.iter().map(|c| &c.metadata).collect();

        fs::write(
            dir.join(INDEX_FILE),
            serialize_compressed(&self.index, ARTIFACT_COMPRESSION)?,
        )?;
        fs::write(
            dir.join(METADATA_FILE),
            serialize_compressed(&metadata, ARTIFACT_COMPRESSION)?,
        )?;
        fs::write(
            dir.join(CHUNKS_FILE),
            serialize_compressed(&texts, ARTIFACT_COMPRESSION)?,
        )?;

        info!(
            chunks = self.chunks.len(),
            index_rows = self.index.len(),
            dir = %dir.display(),
            "saved complaint store"
        );
        Ok(())
    }

    /// Load the three store artifacts from `dir`.
    ///
    /// Chunk texts and metadata must agree in length; a mismatch means the
    /// artifacts were regenerated out of step and the arena cannot be
    /// reassembled. A mismatch between index rows and arena length is
    /// tolerated the same way as in [`ComplaintStore::new`].
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let index: FlatIndex = load_artifact(dir, INDEX_FILE)?;
        let metadata: Vec<ChunkMetadata> = load_artifact(dir, METADATA_FILE)?;
        let texts: Vec<String> = load_artifact(dir, CHUNKS_FILE)?;

        if texts.len() != metadata.len() {
            return Err(Error::StoreMisaligned {
                chunks: texts.len(),
                metadata: metadata.len(),
            });
        }

        let chunks: Vec<Chunk> = texts
            .into_iter()
            .zip(metadata)
            .map(|(text, metadata)| Chunk { text, metadata })
            .collect();

        info!(
            chunks = chunks.len(),
            index_rows = index.len(),
            dimension = index.dimension(),
            dir = %dir.display(),
            "loaded complaint store"
        );
        Ok(Self::new(index, chunks))
    }
}

fn load_artifact<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let path = dir.join(name);
    let bytes = fs::read(&path).map_err(|e| Error::StoreLoad {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    deserialize_compressed(&bytes, ARTIFACT_COMPRESSION).map_err(|e| Error::StoreLoad {
        path,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunks() -> Vec<Chunk> {
        vec![
            Chunk::new(
                "unauthorized charges on my credit card",
                ChunkMetadata::new("CMP-1", "Credit card"),
            ),
            Chunk::new(
                "loan interest rate changed without notice",
                ChunkMetadata::new("CMP-2", "Personal loan"),
            ),
            Chunk::new(
                "transfer took ten days to arrive",
                ChunkMetadata::new("CMP-3", "Money transfer"),
            ),
        ]
    }

    fn sample_store() -> ComplaintStore {
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let index = FlatIndex::build(3, vectors).unwrap();
        ComplaintStore::new(index, sample_chunks())
    }

    // ============================================================
    // Compression Tests
    // ============================================================

    #[test]
    fn test_compression_as_str() {
        assert_eq!(Compression::Lz4.as_str(), "lz4");
        assert_eq!(Compression::Zstd.as_str(), "zstd");
    }

    #[test]
    fn test_compression_default() {
        assert_eq!(Compression::default(), Compression::Lz4);
    }

    #[test]
    fn test_lz4_compress_decompress() {
        let data = b"hello world hello world hello world".to_vec();
        let compressed = Compression::Lz4.compress(&data).unwrap();
        let decompressed = Compression::Lz4.decompress(&compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_zstd_compress_decompress() {
        let data = b"hello world hello world hello world".to_vec();
        let compressed = Compression::Zstd.compress(&data).unwrap();
        let decompressed = Compression::Zstd.decompress(&compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_empty_data_compression() {
        let empty: Vec<u8> = vec![];

        let lz4_compressed = Compression::Lz4.compress(&empty).unwrap();
        assert!(lz4_compressed.is_empty());
        let lz4_decompressed = Compression::Lz4.decompress(&lz4_compressed).unwrap();
        assert!(lz4_decompressed.is_empty());

        let zstd_compressed = Compression::Zstd.compress(&empty).unwrap();
        assert!(zstd_compressed.is_empty());
        let zstd_decompressed = Compression::Zstd.decompress(&zstd_compressed).unwrap();
        assert!(zstd_decompressed.is_empty());
    }

    #[test]
    fn test_lz4_compresses_repeated_data() {
        let data = vec![0u8; 10000];
        let compressed = Compression::Lz4.compress(&data).unwrap();
        assert!(compressed.len() < data.len() / 10);
    }

    #[test]
    fn test_serialize_compressed_roundtrip() {
        let chunks = sample_chunks();
        let bytes = serialize_compressed(&chunks, Compression::Lz4).unwrap();
        let restored: Vec<Chunk> = deserialize_compressed(&bytes, Compression::Lz4).unwrap();
        assert_eq!(restored, chunks);
    }

    #[test]
    fn test_deserialize_corrupted_bytes_fails() {
        let garbage = vec![0xde, 0xad, 0xbe, 0xef];
        let result: Result<Vec<Chunk>> = deserialize_compressed(&garbage, Compression::Lz4);
        assert!(matches!(result, Err(Error::SerializationError(_))));
    }

    // ============================================================
    // ComplaintStore Tests
    // ============================================================

    #[test]
    fn test_store_chunk_lookup() {
        let store = sample_store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.chunk(1).unwrap().metadata.complaint_id, "CMP-2");
        assert!(store.chunk(3).is_none());
    }

    #[test]
    fn test_store_tolerates_index_arena_length_mismatch() {
        let index = FlatIndex::build(3, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
        let store = ComplaintStore::new(index, sample_chunks());
        assert_eq!(store.index().len(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = sample_store();
        store.save(dir.path()).unwrap();

        let loaded = ComplaintStore::load(dir.path()).unwrap();
        assert_eq!(loaded.chunks(), store.chunks());
        assert_eq!(loaded.index().len(), store.index().len());
        assert_eq!(loaded.index().dimension(), store.index().dimension());

        let original = store.index().search(&[1.0, 0.0, 0.0], 3).unwrap();
        let recovered = loaded.index().search(&[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_save_writes_three_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        sample_store().save(dir.path()).unwrap();
        assert!(dir.path().join(INDEX_FILE).exists());
        assert!(dir.path().join(METADATA_FILE).exists());
        assert!(dir.path().join(CHUNKS_FILE).exists());
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ComplaintStore::load(dir.path()).unwrap_err();
        match err {
            Error::StoreLoad { path, .. } => {
                assert!(path.ends_with(INDEX_FILE));
            }
            other => panic!("expected store load error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_corrupted_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        sample_store().save(dir.path()).unwrap();
        fs::write(dir.path().join(METADATA_FILE), b"not an artifact").unwrap();

        let err = ComplaintStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::StoreLoad { .. }));
    }

    #[test]
    fn test_load_rejects_misaligned_text_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        sample_store().save(dir.path()).unwrap();

        // Regenerate the metadata artifact one record short.
        let truncated = vec![ChunkMetadata::new("CMP-1", "Credit card")];
        fs::write(
            dir.path().join(METADATA_FILE),
            serialize_compressed(&truncated, Compression::Lz4).unwrap(),
        )
        .unwrap();

        let err = ComplaintStore::load(dir.path()).unwrap_err();
        match err {
            Error::StoreMisaligned { chunks, metadata } => {
                assert_eq!(chunks, 3);
                assert_eq!(metadata, 1);
            }
            other => panic!("expected misaligned store error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_tolerates_shorter_index() {
        let dir = tempfile::tempdir().unwrap();
        sample_store().save(dir.path()).unwrap();

        // Regenerate the index artifact with fewer rows than the arena.
        let short_index = FlatIndex::build(3, vec![vec![1.0, 0.0, 0.0]]).unwrap();
        fs::write(
            dir.path().join(INDEX_FILE),
            serialize_compressed(&short_index, Compression::Lz4).unwrap(),
        )
        .unwrap();

        let loaded = ComplaintStore::load(dir.path()).unwrap();
        assert_eq!(loaded.index().len(), 1);
        assert_eq!(loaded.len(), 3);
    }
}
