//! Memory-mapped vector files for persisting embeddings and indexes.
//!
//! Both the raw embedding matrix and the serialized nearest-neighbor index
//! are written in the same little-endian binary layout, distinguished only by
//! their magic bytes.
//!
//! # Storage Format
//!
//! - Header (16 bytes): magic, version, dimension, vector count
//! - Vectors: contiguous f32 rows in little-endian format, in position order
//!
//! Files are memory-mapped on read; the header is validated against the file
//! length so a truncated write is reported as an invalid format instead of
//! yielding short rows.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use memmap2::{Mmap, MmapOptions};
use thiserror::Error;

use crate::vector::types::{VectorDimension, VectorError};

/// Current storage format version.
pub const STORAGE_VERSION: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 16;

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Errors specific to vector file operations.
#[derive(Error, Debug)]
pub enum VectorStorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid storage format: {0}")]
    InvalidFormat(String),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}

/// Which artifact a vector file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFileKind {
    /// Raw embedding rows, parallel to the id list.
    Embeddings,
    /// Serialized [`FlatIndex`](crate::vector::FlatIndex) contents.
    Index,
}

impl VectorFileKind {
    fn magic(self) -> &'static [u8; 4] {
        match self {
            Self::Embeddings => b"DVEC",
            Self::Index => b"DIDX",
        }
    }
}

/// Writes a header followed by `rows` (flattened, `dimension` values per row).
pub fn write_vectors<W: Write>(
    writer: &mut W,
    kind: VectorFileKind,
    dimension: VectorDimension,
    rows: &[f32],
) -> Result<(), VectorStorageError> {
    if rows.len() % dimension.get() != 0 {
        return Err(VectorStorageError::InvalidFormat(format!(
            "{} values do not divide into rows of dimension {}",
            rows.len(),
            dimension.get()
        )));
    }
    let count = rows.len() / dimension.get();

    writer.write_all(kind.magic())?;
    writer.write_all(&STORAGE_VERSION.to_le_bytes())?;
    writer.write_all(&(dimension.get() as u32).to_le_bytes())?;
    writer.write_all(&(count as u32).to_le_bytes())?;

    let mut buffer = Vec::with_capacity(rows.len() * BYTES_PER_F32);
    for value in rows {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    writer.write_all(&buffer)?;
    writer.flush()?;
    Ok(())
}

/// Read-only, memory-mapped view of a vector file.
#[derive(Debug)]
pub struct MmapVectorFile {
    mmap: Mmap,
    dimension: VectorDimension,
    vector_count: usize,
}

impl MmapVectorFile {
    /// Opens and validates a vector file of the given kind.
    pub fn open(path: impl AsRef<Path>, kind: VectorFileKind) -> Result<Self, VectorStorageError> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the file is opened read-only and is only ever replaced by
        // rename, never modified in place.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let (version, dimension, vector_count) = Self::read_header(&mmap, kind)?;
        if version != STORAGE_VERSION {
            return Err(VectorError::VersionMismatch {
                expected: STORAGE_VERSION,
                actual: version,
            }
            .into());
        }

        let expected_len = vector_count
            .checked_mul(dimension.get())
            .and_then(|values| values.checked_mul(BYTES_PER_F32))
            .and_then(|bytes| bytes.checked_add(HEADER_SIZE))
            .ok_or_else(|| {
                VectorStorageError::InvalidFormat(format!(
                    "Header declares {vector_count} vectors of dimension {}, which overflows the file size",
                    dimension.get()
                ))
            })?;
        if mmap.len() != expected_len {
            return Err(VectorStorageError::InvalidFormat(format!(
                "Header declares {vector_count} vectors of dimension {} ({expected_len} bytes) but file has {} bytes",
                dimension.get(),
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            dimension,
            vector_count,
        })
    }

    /// Returns the number of vectors stored.
    #[must_use]
    pub fn vector_count(&self) -> usize {
        self.vector_count
    }

    /// Returns the vector dimension.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// Reads the row at `position`, or `None` past the end.
    #[must_use]
    pub fn read_vector(&self, position: usize) -> Option<Vec<f32>> {
        if position >= self.vector_count {
            return None;
        }
        let row_bytes = self.dimension.get() * BYTES_PER_F32;
        let start = HEADER_SIZE + position * row_bytes;
        Some(decode_f32s(&self.mmap[start..start + row_bytes]))
    }

    /// Reads every row, in position order.
    pub fn read_all_vectors(&self) -> Vec<Vec<f32>> {
        (0..self.vector_count)
            .filter_map(|position| self.read_vector(position))
            .collect()
    }

    /// Reads every value as one flat buffer.
    pub fn read_flat(&self) -> Vec<f32> {
        decode_f32s(&self.mmap[HEADER_SIZE..])
    }

    fn read_header(
        mmap: &Mmap,
        kind: VectorFileKind,
    ) -> Result<(u32, VectorDimension, usize), VectorStorageError> {
        if mmap.len() < HEADER_SIZE {
            return Err(VectorStorageError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }

        if &mmap[0..4] != kind.magic() {
            return Err(VectorStorageError::InvalidFormat(
                "Invalid magic bytes".to_string(),
            ));
        }

        let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);

        let dim_value = u32::from_le_bytes([mmap[8], mmap[9], mmap[10], mmap[11]]);
        let dimension = VectorDimension::new(dim_value as usize)?;

        let vector_count = u32::from_le_bytes([mmap[12], mmap[13], mmap[14], mmap[15]]) as usize;

        Ok((version, dimension, vector_count))
    }
}

fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_F32)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
