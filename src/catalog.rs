//! Read-only entity table.
//!
//! The catalog is built once (from memory or a cleaned JSON dataset) and
//! shared by the store builder and every query. Table order is preserved and
//! is the order exact matches are reported in.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::error::{RecommendError, RecommendResult};
use crate::types::{Entity, EntityId, deserialize_flag, fold_key};

/// Cuisine assigned to rows whose cuisine field is empty.
pub const DEFAULT_CUISINE: &str = "International";

#[derive(Debug, Clone)]
pub struct Catalog {
    entities: Vec<Entity>,
    positions: HashMap<EntityId, usize>,
}

impl Catalog {
    /// Wraps an already-cleaned entity table.
    ///
    /// Fails if two rows share an id.
    pub fn from_entities(entities: Vec<Entity>) -> RecommendResult<Self> {
        let mut positions = HashMap::with_capacity(entities.len());
        for (position, entity) in entities.iter().enumerate() {
            if positions.insert(entity.id, position).is_some() {
                return Err(RecommendError::DataLoad {
                    path: "<memory>".into(),
                    reason: format!("duplicate entity id {}", entity.id),
                });
            }
        }
        Ok(Self {
            entities,
            positions,
        })
    }

    /// Loads a cleaned dataset: either a JSON array of row objects or JSON
    /// Lines with one object per line.
    ///
    /// Rows without an `id` get their row number, assigned here once.
    /// Multi-valued cuisines keep their first listed value.
    pub fn load_json(path: impl AsRef<Path>) -> RecommendResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| RecommendError::io(path, e))?;

        let data_error = |reason: String| RecommendError::DataLoad {
            path: path.to_path_buf(),
            reason,
        };

        let rows: Vec<RawEntity> = if content.trim_start().starts_with('[') {
            serde_json::from_str(&content).map_err(|e| data_error(e.to_string()))?
        } else {
            content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(line_no, line)| {
                    serde_json::from_str(line)
                        .map_err(|e| data_error(format!("line {}: {e}", line_no + 1)))
                })
                .collect::<Result<_, _>>()?
        };

        let entities = rows
            .into_iter()
            .enumerate()
            .map(|(row, raw)| raw.into_entity(row).map_err(data_error))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(path = %path.display(), rows = entities.len(), "loaded entity table");

        Self::from_entities(entities).map_err(|e| match e {
            RecommendError::DataLoad { reason, .. } => data_error(reason),
            other => other,
        })
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.positions.get(&id).map(|&position| &self.entities[position])
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Entities in table order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Ids in table order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|entity| entity.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Distinct city names, sorted case-insensitively.
    pub fn cities(&self) -> Vec<String> {
        distinct(self.entities.iter().map(|entity| entity.city.as_str()))
    }

    /// Distinct cuisine names, sorted case-insensitively.
    pub fn cuisines(&self) -> Vec<String> {
        distinct(self.entities.iter().map(|entity| entity.cuisine.as_str()))
    }

    /// Distinct cuisines available in `city`.
    pub fn cuisines_in(&self, city: &str) -> Vec<String> {
        let city_key = fold_key(city);
        distinct(
            self.entities
                .iter()
                .filter(|entity| entity.in_city(&city_key))
                .map(|entity| entity.cuisine.as_str()),
        )
    }
}

/// First spelling seen wins for each folded key.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for value in values {
        seen.entry(fold_key(value))
            .or_insert_with(|| value.trim().to_string());
    }
    seen.into_values().collect()
}

/// Row shape accepted from dataset files, tolerant of common column names.
#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default, alias = "restaurant_name", alias = "restaurant")]
    name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, alias = "cuisines")]
    cuisine: Option<String>,
    #[serde(default, alias = "aggregate_rating")]
    rating: Option<f64>,
    #[serde(default)]
    votes: Option<u64>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    locality: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    reviews: Option<String>,
    #[serde(default)]
    price_range: Option<u8>,
    #[serde(default, alias = "average_cost_for_two")]
    avg_cost: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    has_table_booking: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    has_online_delivery: bool,
}

impl RawEntity {
    fn into_entity(self, row: usize) -> Result<Entity, String> {
        let city = self.city.unwrap_or_default().trim().to_string();
        if city.is_empty() {
            return Err(format!("row {row} has no city"));
        }

        let id = match self.id {
            Some(id) => id,
            None => u32::try_from(row).map_err(|_| format!("row {row} exceeds id range"))?,
        };

        Ok(Entity {
            id: EntityId(id),
            name: self.name.unwrap_or_default(),
            city,
            cuisine: primary_cuisine(self.cuisine.as_deref().unwrap_or_default()),
            rating: self.rating.filter(|r| r.is_finite()).unwrap_or(0.0),
            votes: self.votes.unwrap_or(0),
            address: self.address.unwrap_or_default(),
            locality: self.locality.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            reviews: self.reviews.unwrap_or_default(),
            price_range: self.price_range,
            avg_cost: self.avg_cost.unwrap_or(0.0),
            currency: self.currency.unwrap_or_default(),
            has_table_booking: self.has_table_booking,
            has_online_delivery: self.has_online_delivery,
        })
    }
}

/// Reduces a multi-valued cuisine string to its first listed value.
pub fn primary_cuisine(raw: &str) -> String {
    let first = raw.split(',').next().unwrap_or_default().trim();
    if first.is_empty() {
        DEFAULT_CUISINE.to_string()
    } else {
        first.to_string()
    }
}
