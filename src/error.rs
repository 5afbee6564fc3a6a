//! Error types for the complaint answering pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for corpus preparation, retrieval, and generation
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A model backend could not be loaded or reached
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Embedding dimension mismatch
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// A corpus record could not be parsed
    #[error("corpus record at line {line}: {reason}")]
    Corpus {
        /// 1-based line number in the source file
        line: usize,
        /// Parse failure description
        reason: String,
    },

    /// A persisted store artifact could not be read
    #[error("could not load store artifact {path}: {reason}")]
    StoreLoad {
        /// Path of the unreadable artifact
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// Persisted chunk texts and metadata have diverged
    #[error("store artifacts misaligned: {chunks} chunk texts vs {metadata} metadata records")]
    StoreMisaligned {
        /// Number of chunk texts on disk
        chunks: usize,
        /// Number of metadata records on disk
        metadata: usize,
    },

    /// Embedding error
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Text generation error
    #[error("generation error: {0}")]
    Generation(String),

    /// Retrieval failed while answering a question
    #[error("retrieval failed for question: {question}")]
    Retrieval {
        /// The question being answered when retrieval failed
        question: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Serialization error (serde_json)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Serialization error (bincode/compression)
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an error as a retrieval failure for the given question
    #[must_use]
    pub fn retrieval(question: impl Into<String>, source: Error) -> Self {
        Self::Retrieval {
            question: question.into(),
            source: Box::new(source),
        }
    }
}
