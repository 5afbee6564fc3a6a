//! Exact nearest-neighbor vector index

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Squared Euclidean distance between two equal-length vectors
#[must_use]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Flat index over fixed-dimension vectors.
///
/// Vectors sit in insertion order and are never reordered, so the row numbers
/// returned by [`FlatIndex::search`] address the chunk arena directly. Search
/// is an exhaustive scan by squared Euclidean distance; exact by construction
/// and fast enough for a corpus capped in the tens of thousands of chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index over `vectors`, all of dimension `dimension`.
    ///
    /// Row `i` of the index is `vectors[i]`.
    pub fn build(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig(
                "index dimension must be greater than zero".to_string(),
            ));
        }
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
        }
        Ok(Self { dimension, vectors })
    }

    /// Number of indexed vectors
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector dimension
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Find the nearest neighbors of `query`.
    ///
    /// Returns up to `min(k, len)` `(row, distance)` pairs ordered by
    /// ascending squared Euclidean distance. An empty index yields an empty
    /// result for any `k`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, vector)| (row, squared_euclidean(query, vector)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}
