//! Metadata tracking for embedding store persistence.
//!
//! The metadata file is the commit record of a store: it names the model,
//! the dimension and the number of embeddings, and carries a SHA-256 digest
//! of every other artifact. It is always published last, so a store whose
//! artifacts do not match their recorded digests was interrupted mid-save.

use std::fs::File;
use std::io;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RecommendError, RecommendResult};

pub const METADATA_FILE: &str = "metadata.json";

/// Hex SHA-256 of each persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactChecksums {
    pub embeddings: String,
    pub entity_ids: String,
    pub index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Version of the store layout
    pub version: u32,

    /// Name of the embedding model used
    pub model_name: String,

    /// Dimension of embeddings
    pub dimension: usize,

    /// Number of embeddings stored
    pub embedding_count: usize,

    /// Unix timestamp when created
    pub created_at: u64,

    pub checksums: ArtifactChecksums,
}

impl StoreMetadata {
    /// Current metadata version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(
        model_name: &str,
        dimension: usize,
        embedding_count: usize,
        checksums: ArtifactChecksums,
    ) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            model_name: model_name.to_string(),
            dimension,
            embedding_count,
            created_at: get_utc_timestamp(),
            checksums,
        }
    }

    /// Load metadata from `dir`.
    pub fn load(dir: &Path) -> RecommendResult<Self> {
        let path = dir.join(METADATA_FILE);
        let json = std::fs::read_to_string(&path).map_err(|e| RecommendError::io(&path, e))?;

        let metadata: Self = serde_json::from_str(&json)
            .map_err(|e| RecommendError::corrupt(&path, format!("unparseable metadata: {e}")))?;

        if metadata.version != Self::CURRENT_VERSION {
            return Err(RecommendError::corrupt(
                &path,
                format!(
                    "metadata version {} is not supported (expected {})",
                    metadata.version,
                    Self::CURRENT_VERSION
                ),
            ));
        }

        Ok(metadata)
    }

    pub fn to_json(&self) -> RecommendResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RecommendError::Config {
            reason: format!("Failed to serialize store metadata: {e}"),
        })
    }

    /// Check if a metadata file exists in `dir`
    pub fn exists(dir: &Path) -> bool {
        dir.join(METADATA_FILE).exists()
    }
}

pub fn get_utc_timestamp() -> u64 {
    Utc::now().timestamp() as u64
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Streams a file through SHA-256.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
