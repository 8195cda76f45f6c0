use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Stable identifier assigned to an entity once, at ingestion.
///
/// Everything downstream (vectors, the index position list, candidate sets)
/// refers to entities through this id, never through table positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the cleaned entity table.
///
/// `city` and `cuisine` are the category keys used by retrieval; the
/// remaining fields are display data carried through to result records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    pub city: String,
    pub cuisine: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub votes: u64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reviews: String,
    #[serde(default)]
    pub price_range: Option<u8>,
    #[serde(default)]
    pub avg_cost: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_table_booking: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_online_delivery: bool,
}

impl Entity {
    /// Minimal constructor; display fields start empty.
    pub fn new(id: u32, name: &str, city: &str, cuisine: &str) -> Self {
        Self {
            id: EntityId(id),
            name: name.to_string(),
            city: city.to_string(),
            cuisine: cuisine.to_string(),
            rating: 0.0,
            votes: 0,
            address: String::new(),
            locality: String::new(),
            description: String::new(),
            reviews: String::new(),
            price_range: None,
            avg_cost: 0.0,
            currency: String::new(),
            has_table_booking: false,
            has_online_delivery: false,
        }
    }

    pub fn with_quality(mut self, rating: f64, votes: u64) -> Self {
        self.rating = rating;
        self.votes = votes;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn in_city(&self, city_key: &str) -> bool {
        fold_key(&self.city) == city_key
    }

    pub fn serves(&self, cuisine_key: &str) -> bool {
        fold_key(&self.cuisine) == cuisine_key
    }

    /// Ranking key: rating first, votes as tie-break. Missing values were
    /// defaulted to `(0.0, 0)` at ingestion.
    pub fn quality(&self) -> Quality {
        Quality {
            rating: if self.rating.is_nan() { 0.0 } else { self.rating },
            votes: self.votes,
        }
    }

    /// Text for the review/description based decorations.
    pub fn review_text(&self) -> &str {
        if self.reviews.trim().is_empty() {
            &self.description
        } else {
            &self.reviews
        }
    }
}

/// `(rating, votes)` pair with a total order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality {
    pub rating: f64,
    pub votes: u64,
}

impl Eq for Quality {}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quality {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rating
            .total_cmp(&other.rating)
            .then(self.votes.cmp(&other.votes))
    }
}

/// Canonical comparison key for category attributes (city, cuisine).
///
/// Both sides of every category comparison go through this.
pub fn fold_key(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Number(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "yes" | "y" | "true" | "1"
        ),
        Some(Flag::Number(n)) => n != 0,
        None => false,
    })
}
