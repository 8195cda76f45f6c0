//! Hybrid retrieval: exact category filtering with a semantic fallback.
//!
//! A query `(city, cuisine, top_k)` runs as follows:
//!
//! 1. Exact matches `E`: entities whose city and cuisine both equal the query
//!    after case folding, in table order.
//! 2. If `|E| >= top_k`, the candidates are the first `top_k` of `E` and no
//!    embedding work happens.
//! 3. Otherwise the query city must exist; an unknown city returns nothing.
//! 4. A cuisine description is embedded and the whole index searched for as
//!    many neighbors as the city has entities. Neighbors outside the city,
//!    already in `E`, or of another cuisine are dropped; the nearest
//!    `top_k - |E|` survivors follow `E`.
//! 5. Duplicates are removed, first occurrence kept.
//! 6. Candidates are sorted by `(rating, votes)` descending. The sort is
//!    stable, so equal scores keep candidate order.
//! 7. The list is cut to `top_k`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::assemble::{Recommendation, ResultAssembler};
use crate::catalog::Catalog;
use crate::config::Settings;
use crate::display::create_progress_bar;
use crate::error::{RecommendError, RecommendResult};
use crate::store::{EmbeddingStore, StoreSnapshot};
use crate::text::entity_text;
use crate::types::{Entity, EntityId, fold_key};
use crate::vector::EmbeddingGenerator;

/// Where the active store came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    Loaded,
    Built,
}

impl std::fmt::Display for StoreOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Built => write!(f, "built"),
        }
    }
}

/// Owns the catalog, the embedding model and the active store snapshot.
///
/// Construction leaves the engine uninitialised; queries fail with
/// [`RecommendError::NotInitialized`] until [`RetrievalEngine::load_or_build`]
/// or [`RetrievalEngine::install`] has run. Queries only read shared state,
/// so one engine can serve many threads behind an `Arc`.
pub struct RetrievalEngine {
    catalog: Arc<Catalog>,
    generator: Arc<dyn EmbeddingGenerator>,
    settings: Settings,
    assembler: ResultAssembler,
    snapshot: RwLock<Option<Arc<StoreSnapshot>>>,
    show_progress: bool,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("entities", &self.catalog.len())
            .field("model", &self.generator.model_name())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl RetrievalEngine {
    pub fn new(
        catalog: Arc<Catalog>,
        generator: Arc<dyn EmbeddingGenerator>,
        settings: Settings,
    ) -> Self {
        let assembler = ResultAssembler::from_config(&settings.decoration);
        Self {
            catalog,
            generator,
            settings,
            assembler,
            snapshot: RwLock::new(None),
            show_progress: false,
        }
    }

    /// Replaces the default decoration collaborators.
    #[must_use]
    pub fn with_assembler(mut self, assembler: ResultAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Shows a progress bar while embeddings are generated.
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// Number of entities in the active store.
    pub fn indexed_count(&self) -> Option<usize> {
        self.snapshot.read().as_ref().map(|snapshot| snapshot.len())
    }

    /// Loads the store at `dir` when it is valid for this catalog and model,
    /// otherwise generates, saves and installs a fresh one.
    ///
    /// Run once before serving queries; two builders on one directory race.
    pub fn load_or_build(
        &self,
        dir: impl AsRef<Path>,
        force: bool,
    ) -> RecommendResult<StoreOrigin> {
        let store = EmbeddingStore::new(dir.as_ref());

        if force {
            tracing::info!(path = %store.path().display(), "forced rebuild of embedding store");
        } else if let Some(snapshot) = store.load(Some(self.generator.model_name())) {
            if snapshot.ids() == self.catalog.ids().as_slice() {
                self.install(snapshot)?;
                return Ok(StoreOrigin::Loaded);
            }
            tracing::warn!(
                path = %store.path().display(),
                stored = snapshot.len(),
                catalog = self.catalog.len(),
                "stored entity ids differ from the catalog, rebuilding"
            );
        }

        let snapshot = self.build(&store)?;
        self.install(snapshot)?;
        Ok(StoreOrigin::Built)
    }

    fn build(&self, store: &EmbeddingStore) -> RecommendResult<StoreSnapshot> {
        let entities = self.catalog.entities();
        let progress = self
            .show_progress
            .then(|| create_progress_bar(entities.len() as u64, "Embedding entities"));

        let (vectors, ids) = EmbeddingStore::generate(
            entities,
            entity_text,
            self.generator.as_ref(),
            self.settings.embedding.batch_size,
            |done| {
                if let Some(bar) = &progress {
                    bar.inc(done as u64);
                }
            },
        )?;

        if let Some(bar) = &progress {
            bar.finish_with_message("Embeddings ready");
        }

        store.save(
            self.generator.dimension(),
            vectors,
            ids,
            self.generator.model_name(),
        )
    }

    /// Activates a snapshot built elsewhere.
    ///
    /// The snapshot must come from the same embedding model: its dimension is
    /// checked against the model here so skew surfaces before any query.
    pub fn install(&self, snapshot: StoreSnapshot) -> RecommendResult<()> {
        let expected = self.generator.dimension().get();
        let actual = snapshot.dimension().get();
        if expected != actual {
            return Err(RecommendError::DimensionMismatch { expected, actual });
        }

        tracing::debug!(count = snapshot.len(), "installed store snapshot");
        *self.snapshot.write() = Some(Arc::new(snapshot));
        Ok(())
    }

    /// Ranked entity ids for `(city, cuisine)`, at most `top_k` of them.
    pub fn recommend_ids(
        &self,
        city: &str,
        cuisine: &str,
        top_k: usize,
    ) -> RecommendResult<Vec<EntityId>> {
        let snapshot = self
            .snapshot
            .read()
            .clone()
            .ok_or(RecommendError::NotInitialized)?;

        let city_key = fold_key(city);
        let cuisine_key = fold_key(cuisine);

        let exact: Vec<&Entity> = self
            .catalog
            .iter()
            .filter(|entity| entity.in_city(&city_key) && entity.serves(&cuisine_key))
            .collect();

        let candidates: Vec<&Entity> = if exact.len() >= top_k {
            tracing::debug!(city, cuisine, exact = exact.len(), "exact matches suffice");
            exact[..top_k].to_vec()
        } else {
            let city_size = self
                .catalog
                .iter()
                .filter(|entity| entity.in_city(&city_key))
                .count();
            if city_size == 0 {
                tracing::debug!(city, "city not in catalog");
                return Ok(Vec::new());
            }

            let fallback = self.semantic_fallback(
                &snapshot,
                &exact,
                &city_key,
                &cuisine_key,
                cuisine,
                city_size,
                top_k - exact.len(),
            )?;
            tracing::debug!(
                city,
                cuisine,
                exact = exact.len(),
                fallback = fallback.len(),
                "semantic fallback"
            );
            exact.into_iter().chain(fallback).collect()
        };

        let mut seen = HashSet::with_capacity(candidates.len());
        let mut ranked: Vec<&Entity> = candidates
            .into_iter()
            .filter(|entity| seen.insert(entity.id))
            .collect();

        ranked.sort_by(|a, b| b.quality().cmp(&a.quality()));
        ranked.truncate(top_k);

        Ok(ranked.into_iter().map(|entity| entity.id).collect())
    }

    /// Nearest same-city, same-cuisine entities not already in `exact`.
    #[allow(clippy::too_many_arguments)]
    fn semantic_fallback<'a>(
        &'a self,
        snapshot: &StoreSnapshot,
        exact: &[&Entity],
        city_key: &str,
        cuisine_key: &str,
        cuisine: &str,
        search_width: usize,
        needed: usize,
    ) -> RecommendResult<Vec<&'a Entity>> {
        let query = self.settings.retrieval.cuisine_query(cuisine);
        let query_vector = self.generator.embed(&query)?;
        let neighbors = snapshot.index().search(&query_vector, search_width)?;

        let exact_ids: HashSet<EntityId> = exact.iter().map(|entity| entity.id).collect();

        Ok(neighbors
            .iter()
            .filter_map(|neighbor| snapshot.id_at(neighbor.position))
            .filter_map(|id| self.catalog.get(id))
            .filter(|entity| entity.in_city(city_key))
            .filter(|entity| !exact_ids.contains(&entity.id) && entity.serves(cuisine_key))
            .take(needed)
            .collect())
    }

    /// Ranked, decorated records for `(city, cuisine)`.
    pub fn recommend(
        &self,
        city: &str,
        cuisine: &str,
        top_k: usize,
    ) -> RecommendResult<Vec<Recommendation>> {
        let ids = self.recommend_ids(city, cuisine, top_k)?;
        Ok(self.assembler.assemble(&self.catalog, &ids))
    }

    /// [`RetrievalEngine::recommend`] with the configured default `top_k`.
    pub fn recommend_default(
        &self,
        city: &str,
        cuisine: &str,
    ) -> RecommendResult<Vec<Recommendation>> {
        self.recommend(city, cuisine, self.settings.retrieval.top_k)
    }
}
