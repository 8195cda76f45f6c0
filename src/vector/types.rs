//! Dimension and error types shared by the index, the vector files and the
//! embedding models.
//!
//! Every vector in one store has the same length. [`VectorDimension`]
//! carries that length, and each boundary that accepts a vector checks it.

use thiserror::Error;

/// Length of every vector in a store, fixed by the embedding model.
///
/// Always non-zero. The value is discovered from the model at startup and
/// recorded in store headers, so it is never assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Rejects `vector` unless it has exactly this many components.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// One search hit: the index position of a stored vector and its squared
/// L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Errors raised by the vector layer.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Entities and queries must be embedded by the same model; rebuild the store after changing [embedding].model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Check [embedding].model and that the model cache directory is writable"
    )]
    EmbeddingFailed(String),

    #[error(
        "Vector file version {actual} is not supported (expected {expected})\nSuggestion: Rebuild the store with 'dinerank index --force'"
    )]
    VersionMismatch { expected: u32, actual: u32 },
}
