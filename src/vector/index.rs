//! Exact nearest-neighbor index over a fixed vector collection.
//!
//! Vectors are addressed by *position* (insertion order). Callers that need
//! entity ids keep a parallel position → id list next to the index.

use std::io::Write;
use std::path::Path;

use rayon::prelude::*;

use crate::vector::storage::{MmapVectorFile, VectorFileKind, VectorStorageError, write_vectors};
use crate::vector::{Neighbor, VectorDimension, VectorError};

/// Rows below this count are scored on the calling thread.
const PARALLEL_THRESHOLD: usize = 4096;

/// Brute-force index under squared Euclidean distance.
///
/// Search is exact. Results are ordered by ascending distance with ties
/// broken by position, so identical input always yields identical output.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: VectorDimension,
    /// Row-major storage, `dimension` values per vector.
    data: Vec<f32>,
}

impl FlatIndex {
    /// Creates an empty index for vectors of `dimension`.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Builds an index holding `vectors` at positions `0..vectors.len()`.
    ///
    /// An empty slice yields an empty index; every search on it returns
    /// no results.
    pub fn build(dimension: VectorDimension, vectors: &[Vec<f32>]) -> Result<Self, VectorError> {
        let mut index = Self::new(dimension);
        index.data.reserve(vectors.len() * dimension.get());
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    /// Appends a vector and returns its position.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize, VectorError> {
        self.dimension.validate_vector(vector)?;
        let position = self.len();
        self.data.extend_from_slice(vector);
        Ok(position)
    }

    /// Returns up to `k` nearest neighbors of `query`, nearest first.
    ///
    /// `k` larger than the index returns every element.
    #[must_use = "Search results should be processed to retrieve relevant vectors"]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        self.dimension.validate_vector(query)?;

        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let dim = self.dimension.get();
        let distances: Vec<f32> = if self.len() >= PARALLEL_THRESHOLD {
            self.data
                .par_chunks_exact(dim)
                .map(|row| squared_l2(query, row))
                .collect()
        } else {
            self.data
                .chunks_exact(dim)
                .map(|row| squared_l2(query, row))
                .collect()
        };

        let mut neighbors: Vec<Neighbor> = distances
            .into_iter()
            .enumerate()
            .map(|(position, distance)| Neighbor { position, distance })
            .collect();

        let by_distance = |a: &Neighbor, b: &Neighbor| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        };

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, by_distance);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(by_distance);

        Ok(neighbors)
    }

    /// Returns the vector stored at `position`.
    #[must_use]
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let dim = self.dimension.get();
        self.data.get(position * dim..(position + 1) * dim)
    }

    /// Gets the number of indexed vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension.get()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets the vector dimension.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// Serializes the index.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), VectorStorageError> {
        write_vectors(writer, VectorFileKind::Index, self.dimension, &self.data)
    }

    /// Deserializes an index written by [`FlatIndex::write_to`].
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, VectorStorageError> {
        let file = MmapVectorFile::open(path, VectorFileKind::Index)?;
        Ok(Self {
            dimension: file.dimension(),
            data: file.read_flat(),
        })
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
