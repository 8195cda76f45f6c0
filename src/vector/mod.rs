//! Vector search functionality for semantic fallback retrieval.
//!
//! This module provides embedding generation, an exact nearest-neighbor
//! index and the binary vector file format used by the embedding store.
//!
//! # Architecture
//! [`FlatIndex`] holds every entity vector in insertion order and answers
//! k-nearest-neighbor queries under squared Euclidean distance. Search
//! returns *positions*; translating them back to entity ids is the job of
//! the position list the store keeps alongside the index.

mod embedding;
mod index;
mod storage;
mod types;

// Re-export core types for public API
#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, FastEmbedOptions, parse_embedding_model,
};
pub use index::FlatIndex;
pub use storage::{
    MmapVectorFile, STORAGE_VERSION, VectorFileKind, VectorStorageError, write_vectors,
};
pub use types::{Neighbor, VectorDimension, VectorError};
