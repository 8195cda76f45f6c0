//! Test: embedding store persistence across engine instances
//!
//! A valid store is reused; a damaged, foreign or stale one is rebuilt.

use std::fs;

use crate::common::{KeywordEmbedder, TestStore, engine_with, sample_catalog, sample_entities};
use dinerank::store::{EMBEDDINGS_FILE, IDS_FILE, INDEX_FILE, METADATA_FILE};
use dinerank::{
    Catalog, EmbeddingStore, Entity, RecommendError, StoreMetadata, StoreOrigin, StoreSnapshot,
    VectorDimension,
};

#[test]
fn test_second_engine_loads_what_the_first_built() {
    let store = TestStore::new();

    let first = engine_with(sample_catalog(), KeywordEmbedder::new());
    assert_eq!(first.load_or_build(store.path(), false).unwrap(), StoreOrigin::Built);
    for name in [EMBEDDINGS_FILE, IDS_FILE, INDEX_FILE, METADATA_FILE] {
        assert!(store.path().join(name).exists(), "{name} missing");
    }

    let second = engine_with(sample_catalog(), KeywordEmbedder::new());
    assert_eq!(second.load_or_build(store.path(), false).unwrap(), StoreOrigin::Loaded);
    assert_eq!(second.indexed_count(), Some(sample_entities().len()));

    for (city, cuisine) in [("Rome", "Italian"), ("Paris", "French"), ("Rome", "Japanese")] {
        assert_eq!(
            first.recommend_ids(city, cuisine, 5).unwrap(),
            second.recommend_ids(city, cuisine, 5).unwrap()
        );
    }
}

#[test]
fn test_metadata_describes_the_saved_store() {
    let store = TestStore::new();
    let engine = engine_with(sample_catalog(), KeywordEmbedder::named("keywords-v2"));
    engine.load_or_build(store.path(), false).unwrap();

    let metadata = StoreMetadata::load(&store.path()).unwrap();
    assert_eq!(metadata.model_name, "keywords-v2");
    assert_eq!(metadata.dimension, 9);
    assert_eq!(metadata.embedding_count, sample_entities().len());
    assert_eq!(metadata.version, StoreMetadata::CURRENT_VERSION);
    assert_eq!(metadata.checksums.embeddings.len(), 64);
}

#[test]
fn test_saved_ids_follow_table_order() {
    let store = TestStore::new();
    let engine = engine_with(sample_catalog(), KeywordEmbedder::new());
    engine.load_or_build(store.path(), false).unwrap();

    let snapshot = EmbeddingStore::new(store.path()).try_load(None).unwrap();
    assert_eq!(snapshot.ids(), sample_catalog().ids().as_slice());
    assert_eq!(snapshot.index().len(), snapshot.len());
}

#[test]
fn test_corrupted_vectors_trigger_rebuild() {
    let store = TestStore::new();
    engine_with(sample_catalog(), KeywordEmbedder::new())
        .load_or_build(store.path(), false)
        .unwrap();

    fs::write(store.path().join(EMBEDDINGS_FILE), b"not a vector file").unwrap();

    let strict = EmbeddingStore::new(store.path()).try_load(None);
    assert!(matches!(strict, Err(RecommendError::StoreCorrupt { .. })));
    assert!(EmbeddingStore::new(store.path()).load(None).is_none());

    let engine = engine_with(sample_catalog(), KeywordEmbedder::new());
    assert_eq!(engine.load_or_build(store.path(), false).unwrap(), StoreOrigin::Built);
    assert!(EmbeddingStore::new(store.path()).try_load(None).is_ok());
}

#[test]
fn test_missing_artifact_triggers_rebuild() {
    let store = TestStore::new();
    engine_with(sample_catalog(), KeywordEmbedder::new())
        .load_or_build(store.path(), false)
        .unwrap();

    fs::remove_file(store.path().join(IDS_FILE)).unwrap();

    let engine = engine_with(sample_catalog(), KeywordEmbedder::new());
    assert_eq!(engine.load_or_build(store.path(), false).unwrap(), StoreOrigin::Built);
    assert!(store.path().join(IDS_FILE).exists());
}

#[test]
fn test_missing_metadata_means_no_store() {
    let store = TestStore::new();
    engine_with(sample_catalog(), KeywordEmbedder::new())
        .load_or_build(store.path(), false)
        .unwrap();

    fs::remove_file(store.path().join(METADATA_FILE)).unwrap();

    let handle = EmbeddingStore::new(store.path());
    assert!(!handle.exists());
    assert!(handle.load(None).is_none());
}

#[test]
fn test_store_from_another_model_is_rebuilt() {
    let store = TestStore::new();
    engine_with(sample_catalog(), KeywordEmbedder::named("model-a"))
        .load_or_build(store.path(), false)
        .unwrap();

    let engine = engine_with(sample_catalog(), KeywordEmbedder::named("model-b"));
    assert_eq!(engine.load_or_build(store.path(), false).unwrap(), StoreOrigin::Built);
    assert_eq!(StoreMetadata::load(&store.path()).unwrap().model_name, "model-b");
}

#[test]
fn test_changed_catalog_is_rebuilt() {
    let store = TestStore::new();
    engine_with(sample_catalog(), KeywordEmbedder::new())
        .load_or_build(store.path(), false)
        .unwrap();

    let mut entities = sample_entities();
    entities.push(Entity::new(10, "Ramen Ya", "Paris", "Japanese").with_quality(4.6, 80));
    let engine = engine_with(Catalog::from_entities(entities).unwrap(), KeywordEmbedder::new());

    assert_eq!(engine.load_or_build(store.path(), false).unwrap(), StoreOrigin::Built);
    assert_eq!(engine.indexed_count(), Some(10));
    assert_eq!(
        engine.recommend_ids("Paris", "Japanese", 5).unwrap(),
        vec![dinerank::EntityId(10)]
    );
}

#[test]
fn test_force_rebuilds_a_valid_store() {
    let store = TestStore::new();
    let engine = engine_with(sample_catalog(), KeywordEmbedder::new());
    engine.load_or_build(store.path(), false).unwrap();

    assert_eq!(engine.load_or_build(store.path(), true).unwrap(), StoreOrigin::Built);
    assert_eq!(engine.load_or_build(store.path(), false).unwrap(), StoreOrigin::Loaded);
}

#[test]
fn test_install_rejects_snapshot_of_other_dimension() {
    let engine = engine_with(sample_catalog(), KeywordEmbedder::new());
    let dimension = VectorDimension::new(4).unwrap();
    let snapshot = StoreSnapshot::new(
        dimension,
        vec![vec![0.5; 4]],
        vec![dinerank::EntityId(1)],
    )
    .unwrap();

    match engine.install(snapshot) {
        Err(RecommendError::DimensionMismatch { expected, actual }) => {
            assert_eq!(expected, 9);
            assert_eq!(actual, 4);
        }
        other => panic!("Expected DimensionMismatch, got {other:?}"),
    }
    assert!(!engine.is_initialized());
}
