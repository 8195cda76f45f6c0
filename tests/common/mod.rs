//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dinerank::{
    Catalog, EmbeddingGenerator, Entity, RetrievalEngine, Settings, VectorDimension, VectorError,
};
use tempfile::TempDir;

const KEYWORDS: [&str; 8] = [
    "italian", "pizza", "pasta", "french", "japanese", "sushi", "indian", "curry",
];

/// Deterministic bag-of-keywords embedder.
///
/// Each keyword owns one slot; a small constant keeps vectors non-zero.
pub struct KeywordEmbedder {
    name: String,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::named("keyword-test")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl EmbeddingGenerator for KeywordEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut vector: Vec<f32> = KEYWORDS
                    .iter()
                    .map(|keyword| lower.matches(keyword).count() as f32)
                    .collect();
                vector.push(0.05);
                let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
                vector.iter().map(|v| v / norm).collect()
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(KEYWORDS.len() + 1).unwrap()
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// A small multi-city table with ties, missing quality and mixed case.
pub fn sample_entities() -> Vec<Entity> {
    vec![
        Entity::new(1, "Luigi", "Rome", "Italian")
            .with_quality(4.5, 100)
            .with_description("Wood fired pizza and fresh pasta"),
        Entity::new(2, "Nonna", "Rome", "Italian")
            .with_quality(4.8, 10)
            .with_description("Grandmother's pasta"),
        Entity::new(3, "Sakura", "Rome", "Japanese")
            .with_quality(4.9, 900)
            .with_description("Sushi counter"),
        Entity::new(4, "Trattoria Blu", "ROME", "italian")
            .with_quality(4.5, 300)
            .with_description("Classic italian"),
        Entity::new(5, "Da Michele", "rome", "Italian")
            .with_description("Pizza, no ratings yet"),
        Entity::new(6, "Le Bistro", "Paris", "French")
            .with_quality(4.1, 250)
            .with_description("French classics"),
        Entity::new(7, "Pizzeria Paris", "Paris", "Italian")
            .with_quality(3.8, 40)
            .with_description("Pizza by the slice"),
        Entity::new(8, "Curry Leaf", "Paris", "Indian")
            .with_quality(4.4, 120)
            .with_description("Curry and tandoor"),
        Entity::new(9, "Osteria", "Rome", "Italian")
            .with_quality(4.5, 300)
            .with_description("Pasta and wine"),
    ]
}

pub fn sample_catalog() -> Catalog {
    Catalog::from_entities(sample_entities()).unwrap()
}

pub fn engine_with(catalog: Catalog, generator: KeywordEmbedder) -> RetrievalEngine {
    RetrievalEngine::new(Arc::new(catalog), Arc::new(generator), Settings::default())
}

/// Engine over the sample table with a freshly built store in `dir`.
pub fn ready_engine(dir: &Path) -> RetrievalEngine {
    let engine = engine_with(sample_catalog(), KeywordEmbedder::new());
    engine.load_or_build(dir, false).unwrap();
    engine
}

pub struct TestStore {
    pub dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("store")
    }
}
