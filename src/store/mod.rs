//! Embedding store: the persisted {vectors, entity ids, index} triple.
//!
//! # Layout
//!
//! ```text
//! <dir>/embeddings.vec   raw vectors, row i belongs to ids[i]
//! <dir>/entity_ids.json  position -> entity id list
//! <dir>/index.bin        serialized FlatIndex built from the same rows
//! <dir>/metadata.json    model, dimension, count and artifact digests
//! ```
//!
//! Each artifact is written to a temporary file inside `<dir>` and renamed
//! into place; `metadata.json` goes last. Loading re-checks digests, lengths
//! and dimensions, so a save interrupted between renames reads back as a
//! corrupt store and is regenerated. Two processes saving into the same
//! directory at once can still interleave; run one builder per directory.

mod metadata;

pub use metadata::{
    ArtifactChecksums, METADATA_FILE, StoreMetadata, file_sha256, get_utc_timestamp, sha256_hex,
};

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{RecommendError, RecommendResult};
use crate::types::{Entity, EntityId};
use crate::vector::{
    EmbeddingGenerator, FlatIndex, MmapVectorFile, VectorDimension, VectorFileKind,
    VectorStorageError, write_vectors,
};

pub const EMBEDDINGS_FILE: &str = "embeddings.vec";
pub const IDS_FILE: &str = "entity_ids.json";
pub const INDEX_FILE: &str = "index.bin";

/// A consistent in-memory triple: `vectors[i]` is the embedding of `ids[i]`
/// and sits at position `i` of `index`.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    vectors: Vec<Vec<f32>>,
    ids: Vec<EntityId>,
    index: FlatIndex,
}

impl StoreSnapshot {
    /// Validates the pairing and builds the index from `vectors`.
    pub fn new(
        dimension: VectorDimension,
        vectors: Vec<Vec<f32>>,
        ids: Vec<EntityId>,
    ) -> RecommendResult<Self> {
        if vectors.len() != ids.len() {
            return Err(RecommendError::Config {
                reason: format!(
                    "{} vectors cannot be paired with {} entity ids",
                    vectors.len(),
                    ids.len()
                ),
            });
        }
        if let Some(duplicate) = first_duplicate(&ids) {
            return Err(RecommendError::Config {
                reason: format!("entity id {duplicate} appears more than once"),
            });
        }

        let index = FlatIndex::build(dimension, &vectors)?;
        Ok(Self {
            vectors,
            ids,
            index,
        })
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Entity ids in position order.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn dimension(&self) -> VectorDimension {
        self.index.dimension()
    }

    /// Translates an index position into its entity id.
    pub fn id_at(&self, position: usize) -> Option<EntityId> {
        self.ids.get(position).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Handle on one store directory.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    dir: PathBuf,
}

impl EmbeddingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Whether a committed store appears to be present.
    pub fn exists(&self) -> bool {
        StoreMetadata::exists(&self.dir)
    }

    /// Embeds every entity in table order.
    ///
    /// `ids[i]` always names the entity whose text produced `vectors[i]`.
    /// `on_batch` receives the number of entities finished after each batch.
    pub fn generate<F, P>(
        entities: &[Entity],
        text_extractor: F,
        generator: &dyn EmbeddingGenerator,
        batch_size: usize,
        mut on_batch: P,
    ) -> RecommendResult<(Vec<Vec<f32>>, Vec<EntityId>)>
    where
        F: Fn(&Entity) -> String,
        P: FnMut(usize),
    {
        let dimension = generator.dimension();
        let mut vectors = Vec::with_capacity(entities.len());
        let mut ids = Vec::with_capacity(entities.len());

        for chunk in entities.chunks(batch_size.max(1)) {
            let texts: Vec<String> = chunk.iter().map(&text_extractor).collect();
            let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let embeddings = generator.generate_embeddings(&text_refs)?;

            if embeddings.len() != chunk.len() {
                return Err(RecommendError::Embedding(format!(
                    "model returned {} vectors for {} texts",
                    embeddings.len(),
                    chunk.len()
                )));
            }

            for (entity, embedding) in chunk.iter().zip(embeddings) {
                dimension.validate_vector(&embedding)?;
                ids.push(entity.id);
                vectors.push(embedding);
            }
            on_batch(chunk.len());
        }

        tracing::info!(
            count = vectors.len(),
            model = generator.model_name(),
            "generated entity embeddings"
        );
        Ok((vectors, ids))
    }

    /// Persists `vectors`/`ids` together with a freshly built index, creating
    /// the directory if needed. Returns the in-memory snapshot that was
    /// written.
    pub fn save(
        &self,
        dimension: VectorDimension,
        vectors: Vec<Vec<f32>>,
        ids: Vec<EntityId>,
        model_name: &str,
    ) -> RecommendResult<StoreSnapshot> {
        let snapshot = StoreSnapshot::new(dimension, vectors, ids)?;
        self.save_snapshot(&snapshot, model_name)?;
        Ok(snapshot)
    }

    /// Persists an already-built snapshot.
    pub fn save_snapshot(&self, snapshot: &StoreSnapshot, model_name: &str) -> RecommendResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| RecommendError::io(&self.dir, e))?;

        let flat: Vec<f32> = snapshot.vectors.iter().flatten().copied().collect();
        let mut embeddings_bytes = Vec::with_capacity(flat.len() * 4 + 16);
        write_vectors(
            &mut embeddings_bytes,
            VectorFileKind::Embeddings,
            snapshot.dimension(),
            &flat,
        )
        .map_err(|e| self.storage_error(EMBEDDINGS_FILE, e))?;

        let mut index_bytes = Vec::with_capacity(embeddings_bytes.len());
        snapshot
            .index
            .write_to(&mut index_bytes)
            .map_err(|e| self.storage_error(INDEX_FILE, e))?;

        let ids_bytes = serde_json::to_vec(&snapshot.ids).map_err(|e| RecommendError::Config {
            reason: format!("Failed to serialize entity ids: {e}"),
        })?;

        let checksums = ArtifactChecksums {
            embeddings: sha256_hex(&embeddings_bytes),
            entity_ids: sha256_hex(&ids_bytes),
            index: sha256_hex(&index_bytes),
        };
        let metadata = StoreMetadata::new(
            model_name,
            snapshot.dimension().get(),
            snapshot.len(),
            checksums,
        );

        self.publish(EMBEDDINGS_FILE, &embeddings_bytes)?;
        self.publish(IDS_FILE, &ids_bytes)?;
        self.publish(INDEX_FILE, &index_bytes)?;
        self.publish(METADATA_FILE, metadata.to_json()?.as_bytes())?;

        tracing::info!(
            path = %self.dir.display(),
            count = snapshot.len(),
            dimension = snapshot.dimension().get(),
            "saved embedding store"
        );
        Ok(())
    }

    /// Reads the triple back.
    ///
    /// Any missing, unreadable or inconsistent artifact yields `None`; the
    /// caller should treat that as "no cache" and rebuild. With
    /// `expected_model`, a store built by another model is also rejected.
    pub fn load(&self, expected_model: Option<&str>) -> Option<StoreSnapshot> {
        if !self.exists() {
            tracing::debug!(path = %self.dir.display(), "no embedding store on disk");
            return None;
        }

        match self.try_load(expected_model) {
            Ok(snapshot) => {
                tracing::info!(
                    path = %self.dir.display(),
                    count = snapshot.len(),
                    "loaded embedding store"
                );
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.dir.display(),
                    error = %e,
                    "discarding embedding store"
                );
                None
            }
        }
    }

    /// Strict form of [`EmbeddingStore::load`] reporting why a store was
    /// rejected.
    pub fn try_load(&self, expected_model: Option<&str>) -> RecommendResult<StoreSnapshot> {
        let metadata = StoreMetadata::load(&self.dir)?;

        if let Some(expected) = expected_model {
            if metadata.model_name != expected {
                return Err(RecommendError::corrupt(
                    &self.dir,
                    format!(
                        "built with model '{}', configured model is '{expected}'",
                        metadata.model_name
                    ),
                ));
            }
        }

        self.verify_checksum(EMBEDDINGS_FILE, &metadata.checksums.embeddings)?;
        self.verify_checksum(IDS_FILE, &metadata.checksums.entity_ids)?;
        self.verify_checksum(INDEX_FILE, &metadata.checksums.index)?;

        let embeddings =
            MmapVectorFile::open(self.dir.join(EMBEDDINGS_FILE), VectorFileKind::Embeddings)
                .map_err(|e| self.storage_error(EMBEDDINGS_FILE, e))?;
        let index = FlatIndex::read_from(self.dir.join(INDEX_FILE))
            .map_err(|e| self.storage_error(INDEX_FILE, e))?;

        let ids_path = self.dir.join(IDS_FILE);
        let ids_json =
            std::fs::read_to_string(&ids_path).map_err(|e| RecommendError::io(&ids_path, e))?;
        let ids: Vec<EntityId> = serde_json::from_str(&ids_json)
            .map_err(|e| RecommendError::corrupt(&ids_path, e.to_string()))?;

        let count = metadata.embedding_count;
        if embeddings.vector_count() != count || ids.len() != count || index.len() != count {
            return Err(RecommendError::corrupt(
                &self.dir,
                format!(
                    "length mismatch: {} vectors, {} ids, {} indexed, metadata says {count}",
                    embeddings.vector_count(),
                    ids.len(),
                    index.len()
                ),
            ));
        }

        let dimension = embeddings.dimension();
        if dimension.get() != metadata.dimension || index.dimension() != dimension {
            return Err(RecommendError::corrupt(
                &self.dir,
                format!(
                    "dimension mismatch: vectors {}, index {}, metadata {}",
                    dimension.get(),
                    index.dimension().get(),
                    metadata.dimension
                ),
            ));
        }

        let vectors = embeddings.read_all_vectors();
        let diverged = vectors
            .iter()
            .enumerate()
            .any(|(position, vector)| index.vector(position) != Some(vector.as_slice()));
        if diverged {
            return Err(RecommendError::corrupt(
                &self.dir,
                "index rows differ from stored vectors",
            ));
        }

        if let Some(duplicate) = first_duplicate(&ids) {
            return Err(RecommendError::corrupt(
                &ids_path,
                format!("entity id {duplicate} appears more than once"),
            ));
        }

        Ok(StoreSnapshot {
            vectors,
            ids,
            index,
        })
    }

    /// Writes `bytes` to a sibling temp file and renames it over `name`.
    fn publish(&self, name: &str, bytes: &[u8]) -> RecommendResult<()> {
        let target = self.dir.join(name);
        let mut temp =
            NamedTempFile::new_in(&self.dir).map_err(|e| RecommendError::io(&self.dir, e))?;
        temp.write_all(bytes)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| RecommendError::io(temp.path(), e))?;
        temp.persist(&target)
            .map_err(|e| RecommendError::io(&target, e.error))?;
        Ok(())
    }

    fn verify_checksum(&self, name: &str, expected: &str) -> RecommendResult<()> {
        let path = self.dir.join(name);
        let actual = file_sha256(&path).map_err(|e| RecommendError::io(&path, e))?;
        if actual != expected {
            return Err(RecommendError::corrupt(&path, "checksum mismatch"));
        }
        Ok(())
    }

    fn storage_error(&self, name: &str, err: VectorStorageError) -> RecommendError {
        match err {
            VectorStorageError::Io(e) => RecommendError::io(self.dir.join(name), e),
            VectorStorageError::Vector(e) => e.into(),
            VectorStorageError::InvalidFormat(reason) => {
                RecommendError::corrupt(self.dir.join(name), reason)
            }
        }
    }
}

fn first_duplicate(ids: &[EntityId]) -> Option<EntityId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().find(|id| !seen.insert(*id))
}
