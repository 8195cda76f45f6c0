//! Test: retrieval with the real fastembed model
//!
//! These download the embedding model on first run and are ignored by
//! default.

use std::sync::Arc;

use crate::common::{TestStore, sample_catalog};
use dinerank::vector::parse_embedding_model;
use dinerank::{EmbeddingGenerator, EntityId, FastEmbedGenerator, RetrievalEngine, Settings};

fn generator(store: &TestStore) -> FastEmbedGenerator {
    let mut options = Settings::default().embedding.fastembed_options();
    options.cache_dir = store.dir.path().join("models");
    FastEmbedGenerator::new(&options).expect("Failed to load embedding model")
}

#[test]
fn test_unknown_model_name_is_rejected() {
    assert!(parse_embedding_model("AllMiniLML6V2").is_ok());
    assert!(parse_embedding_model("word2vec").is_err());
}

#[test]
#[ignore = "Downloads 86MB embedding model - unsuitable for CI/CD. Run with: cargo test test_fastembed -- --ignored"]
fn test_fastembed_generator_is_deterministic() {
    let store = TestStore::new();
    let generator = generator(&store);

    assert_eq!(generator.dimension().get(), 384);
    assert_eq!(generator.model_name(), "AllMiniLML6V2");

    let first = generator.embed("Italian restaurant serving pasta").unwrap();
    let second = generator.embed("Italian restaurant serving pasta").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 384);
}

#[test]
#[ignore = "Downloads 86MB embedding model - unsuitable for CI/CD. Run with: cargo test test_fastembed -- --ignored"]
fn test_fastembed_engine_round_trip() {
    let store = TestStore::new();
    let engine = RetrievalEngine::new(
        Arc::new(sample_catalog()),
        Arc::new(generator(&store)),
        Settings::default(),
    );
    engine.load_or_build(store.path(), false).unwrap();

    assert_eq!(
        engine.recommend_ids("Rome", "Italian", 2).unwrap(),
        vec![EntityId(2), EntityId(1)]
    );
    // Fallback path embeds the cuisine query against the real index
    assert_eq!(
        engine.recommend_ids("Paris", "Indian", 5).unwrap(),
        vec![EntityId(8)]
    );
}
