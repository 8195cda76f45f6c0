//! Test: ranking and filtering properties of recommend
//!
//! Every test builds its own store in a temporary directory.

use std::collections::HashSet;

use crate::common::{KeywordEmbedder, TestStore, engine_with, ready_engine, sample_catalog};
use dinerank::{Catalog, Entity, EntityId, RecommendError};

fn ids(raw: &[u32]) -> Vec<EntityId> {
    raw.iter().copied().map(EntityId).collect()
}

#[test]
fn test_two_entity_scenario_orders_by_rating() {
    let store = TestStore::new();
    let catalog = Catalog::from_entities(vec![
        Entity::new(1, "First", "Rome", "Italian").with_quality(4.5, 100),
        Entity::new(2, "Second", "Rome", "Italian").with_quality(4.8, 10),
    ])
    .unwrap();
    let engine = engine_with(catalog, KeywordEmbedder::new());
    engine.load_or_build(store.path(), false).unwrap();

    assert_eq!(engine.recommend_ids("Rome", "Italian", 5).unwrap(), ids(&[2, 1]));
}

#[test]
fn test_absent_city_is_empty_not_error() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());

    for cuisine in ["Italian", "French", "Klingon"] {
        assert!(engine.recommend_ids("Atlantis", cuisine, 5).unwrap().is_empty());
    }
}

#[test]
fn test_city_with_other_cuisines_only_is_empty() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());
    assert!(engine.recommend_ids("Paris", "Japanese", 5).unwrap().is_empty());
    assert!(engine.recommend("Paris", "Japanese", 5).unwrap().is_empty());
}

#[test]
fn test_sufficient_exact_matches_use_table_prefix() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());

    // Rome/Italian in table order: 1, 2, 4, 5, 9
    assert_eq!(engine.recommend_ids("Rome", "Italian", 2).unwrap(), ids(&[2, 1]));
    assert_eq!(engine.recommend_ids("Rome", "Italian", 3).unwrap(), ids(&[2, 4, 1]));
}

#[test]
fn test_full_ranking_breaks_ties_by_votes_then_table_order() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());

    assert_eq!(
        engine.recommend_ids("Rome", "Italian", 10).unwrap(),
        ids(&[2, 4, 9, 1, 5])
    );
}

#[test]
fn test_fewer_matches_than_top_k_is_not_an_error() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());
    assert_eq!(engine.recommend_ids("Paris", "Italian", 5).unwrap(), ids(&[7]));
}

#[test]
fn test_case_insensitive_queries_agree() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());

    for k in [1, 3, 5, 10] {
        let lower = engine.recommend_ids("rome", "italian", k).unwrap();
        assert_eq!(lower, engine.recommend_ids("ROME", "Italian", k).unwrap());
        assert_eq!(lower, engine.recommend_ids("Rome", "ITALIAN", k).unwrap());
    }
}

#[test]
fn test_repeated_queries_are_identical() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());

    let queries = [("Rome", "Italian"), ("Paris", "Indian"), ("Rome", "Japanese")];
    for (city, cuisine) in queries {
        for k in 0..7 {
            assert_eq!(
                engine.recommend_ids(city, cuisine, k).unwrap(),
                engine.recommend_ids(city, cuisine, k).unwrap()
            );
        }
    }
}

#[test]
fn test_results_never_repeat_an_id() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());
    let catalog = sample_catalog();

    for city in catalog.cities() {
        for cuisine in catalog.cuisines() {
            for k in 0..10 {
                let result = engine.recommend_ids(&city, &cuisine, k).unwrap();
                let unique: HashSet<_> = result.iter().collect();
                assert_eq!(unique.len(), result.len(), "{city}/{cuisine}/{k}");
                assert!(result.len() <= k);
            }
        }
    }
}

#[test]
fn test_growing_top_k_keeps_relative_order() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());

    for k in 0..8 {
        let smaller = engine.recommend_ids("Rome", "Italian", k).unwrap();
        let larger = engine.recommend_ids("Rome", "Italian", k + 1).unwrap();

        let common_small: Vec<_> = smaller.iter().filter(|id| larger.contains(id)).collect();
        let common_large: Vec<_> = larger.iter().filter(|id| smaller.contains(id)).collect();
        assert_eq!(common_small, common_large, "k = {k}");
    }
}

#[test]
fn test_results_are_sorted_by_quality() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());
    let catalog = sample_catalog();

    let result = engine.recommend_ids("Rome", "Italian", 10).unwrap();
    let qualities: Vec<_> = result
        .iter()
        .map(|id| catalog.get(*id).unwrap().quality())
        .collect();
    for pair in qualities.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
}

#[test]
fn test_uninitialized_engine_refuses_queries() {
    let engine = engine_with(sample_catalog(), KeywordEmbedder::new());
    match engine.recommend("Rome", "Italian", 5) {
        Err(RecommendError::NotInitialized) => {}
        other => panic!("Expected NotInitialized, got {other:?}"),
    }
}

#[test]
fn test_records_follow_ranked_ids() {
    let store = TestStore::new();
    let engine = ready_engine(&store.path());

    let records = engine.recommend("Rome", "Italian", 3).unwrap();
    let record_ids: Vec<EntityId> = records.iter().map(|r| r.id()).collect();
    assert_eq!(record_ids, engine.recommend_ids("Rome", "Italian", 3).unwrap());

    let nonna = &records[0];
    assert_eq!(nonna.entity.name, "Nonna");
    assert!(nonna.summary_text().contains("4.8/5"));
}
