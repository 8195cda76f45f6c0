//! Test: dataset file to decorated recommendations
//!
//! Loads a cleaned dataset from disk, builds a store and checks the records
//! the CLI would print.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::{KeywordEmbedder, TestStore};
use dinerank::{Catalog, Decoration, EntityId, RecommendError, RetrievalEngine, Settings};

const DATASET: &str = r#"[
  {
    "id": 11,
    "restaurant_name": "Trattoria",
    "city": "New Delhi",
    "cuisines": "Italian, Pizza",
    "aggregate_rating": 4.2,
    "votes": 320,
    "address": "12 Janpath, Connaught Place",
    "locality": "Connaught Place",
    "price_range": 2,
    "average_cost_for_two": 1500,
    "currency": "Indian Rupees(Rs.)",
    "has_table_booking": "Yes",
    "has_online_delivery": "No",
    "reviews": "The pizza was excellent. The service was slow."
  },
  {
    "id": 12,
    "name": "Spice Route",
    "city": "New Delhi",
    "cuisine": "North Indian",
    "rating": 4.6,
    "votes": 1000,
    "description": "Curry and kebabs"
  },
  {"id": 13, "name": "Pasta Bar", "city": "new delhi", "cuisine": "italian", "rating": 4.2, "votes": 500},
  {"id": 14, "name": "Bistro", "city": "Paris", "cuisine": "French", "rating": 4.0}
]"#;

fn write_dataset(store: &TestStore, name: &str, content: &str) -> PathBuf {
    let path = store.dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn engine_for(catalog: Catalog, settings: Settings) -> RetrievalEngine {
    RetrievalEngine::new(Arc::new(catalog), Arc::new(KeywordEmbedder::new()), settings)
}

#[test]
fn test_dataset_to_ranked_records() {
    let store = TestStore::new();
    let catalog = Catalog::load_json(write_dataset(&store, "restaurants.json", DATASET)).unwrap();
    assert_eq!(catalog.len(), 4);

    let engine = engine_for(catalog, Settings::default());
    engine.load_or_build(store.path(), false).unwrap();

    let records = engine.recommend("New Delhi", "Italian", 5).unwrap();
    let ids: Vec<EntityId> = records.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![EntityId(13), EntityId(11)]);

    let trattoria = &records[1];
    assert_eq!(trattoria.entity.cuisine, "Italian");
    assert!(trattoria.entity.has_table_booking);
    assert!(!trattoria.entity.has_online_delivery);
    assert_eq!(
        trattoria.summary_text(),
        "Trattoria is a casual dining (average ₹ 1,500 for two) Italian restaurant, \
         situated in Connaught Place. It has a rating of 4.2/5. \
         You can find it at 12 Janpath, Connaught Place."
    );
    match &trattoria.aspects {
        Decoration::Ready(breakdown) => {
            assert_eq!(breakdown.aspect_sentiments.len(), breakdown.aspects.len());
        }
        other => panic!("Expected aspects, got {other:?}"),
    }

    // No review text to analyze
    assert_eq!(records[0].aspects, Decoration::Empty);
}

#[test]
fn test_records_serialize_for_json_output() {
    let store = TestStore::new();
    let catalog = Catalog::load_json(write_dataset(&store, "restaurants.json", DATASET)).unwrap();
    let engine = engine_for(catalog, Settings::default());
    engine.load_or_build(store.path(), false).unwrap();

    let records = engine.recommend("new delhi", "north indian", 3).unwrap();
    let json = serde_json::to_value(&records).unwrap();

    let first = &json[0];
    assert_eq!(first["id"], 12);
    assert_eq!(first["name"], "Spice Route");
    assert_eq!(first["city"], "New Delhi");
    assert_eq!(first["summary"]["status"], "ready");
    assert_eq!(first["aspects"]["status"], "ready");
}

#[test]
fn test_json_lines_without_ids_get_row_numbers() {
    let store = TestStore::new();
    let lines = concat!(
        r#"{"name": "Luigi", "city": "Rome", "cuisine": "Italian", "rating": 4.5, "votes": 100}"#,
        "\n\n",
        r#"{"name": "Nonna", "city": "Rome", "cuisine": "Italian", "rating": 4.8, "votes": 10}"#,
        "\n",
        r#"{"name": "Sushi Go", "city": "Rome", "cuisines": "", "rating": 3.9}"#,
        "\n",
    );
    let catalog = Catalog::load_json(write_dataset(&store, "restaurants.jsonl", lines)).unwrap();

    assert_eq!(catalog.ids(), vec![EntityId(0), EntityId(1), EntityId(2)]);
    assert_eq!(catalog.get(EntityId(2)).unwrap().cuisine, "International");

    let engine = engine_for(catalog, Settings::default());
    engine.load_or_build(store.path(), false).unwrap();
    assert_eq!(
        engine.recommend_ids("Rome", "Italian", 5).unwrap(),
        vec![EntityId(1), EntityId(0)]
    );
}

#[test]
fn test_row_without_city_is_rejected() {
    let store = TestStore::new();
    let path = write_dataset(
        &store,
        "bad.json",
        r#"[{"id": 1, "name": "Nowhere", "cuisine": "Italian"}]"#,
    );
    assert!(matches!(
        Catalog::load_json(path),
        Err(RecommendError::DataLoad { .. })
    ));
}

#[test]
fn test_malformed_dataset_is_rejected() {
    let store = TestStore::new();
    let path = write_dataset(&store, "broken.json", "[{\"id\": 1,");
    assert!(matches!(
        Catalog::load_json(path),
        Err(RecommendError::DataLoad { .. })
    ));
    assert!(matches!(
        Catalog::load_json(store.dir.path().join("absent.json")),
        Err(RecommendError::Io { .. })
    ));
}

#[test]
fn test_settings_drive_defaults_and_decoration() {
    let store = TestStore::new();
    let catalog = Catalog::load_json(write_dataset(&store, "restaurants.json", DATASET)).unwrap();

    let mut settings = Settings::default();
    settings.retrieval.top_k = 1;
    settings.decoration.enabled = false;
    let engine = engine_for(catalog, settings);
    engine.load_or_build(store.path(), false).unwrap();

    let records = engine.recommend_default("New Delhi", "Italian").unwrap();
    // Enough exact matches: the first in table order is taken before ranking
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), EntityId(11));
    assert_eq!(records[0].summary, Decoration::Empty);
    assert_eq!(records[0].aspects, Decoration::Empty);
}
