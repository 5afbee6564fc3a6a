//! Narrative chunking and the chunk arena records
//!
//! Complaint narratives are cut into overlapping character windows before
//! embedding. Each window becomes a [`Chunk`] carrying the text together with
//! the provenance of the complaint it came from, stored in a single arena
//! addressed by integer row. Vector index rows are arena rows, so retrieval
//! needs no separate join key.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default window size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive windows in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Provenance of a chunk: which complaint it was cut from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Identifier of the originating complaint record
    pub complaint_id: String,
    /// Product category of the originating complaint record
    pub category: String,
}

impl ChunkMetadata {
    /// Create metadata for a complaint record
    #[must_use]
    pub fn new(complaint_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            complaint_id: complaint_id.into(),
            category: category.into(),
        }
    }
}

/// One arena record: a narrative window plus its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The window text
    pub text: String,
    /// Provenance of the window
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk
    #[must_use]
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Window length in characters
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Sliding-window chunker over character positions.
///
/// Windows start every `chunk_size - overlap` characters and span up to
/// `chunk_size` characters, so consecutive windows share `overlap` characters
/// of context. The final window is truncated at the end of the text.
#[derive(Debug, Clone)]
pub struct WindowChunker {
    chunk_size: usize,
    overlap: usize,
}

impl WindowChunker {
    /// Create a chunker with the given window size and overlap.
    ///
    /// `chunk_size` must be non-zero and `overlap` strictly smaller than
    /// `chunk_size`, otherwise the window start would not advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Window size in characters
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive windows in characters
    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into overlapping character windows.
    ///
    /// Empty text yields no windows. Text no longer than the window size
    /// yields at least one window containing the whole text.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut windows = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            windows.push(chars[start..end].iter().collect());
            start += self.chunk_size - self.overlap;
        }
        windows
    }

    /// Cut a narrative into arena records sharing the given provenance
    #[must_use]
    pub fn chunk_narrative(&self, narrative: &str, metadata: &ChunkMetadata) -> Vec<Chunk> {
        self.chunk(narrative)
            .into_iter()
            .map(|text| Chunk::new(text, metadata.clone()))
            .collect()
    }
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}
