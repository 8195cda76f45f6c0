//! Text feature combination for embedding input.
//!
//! Entity text fields are normalized and joined into the single string that
//! gets embedded for each entity.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Entity;

static NON_ALPHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z\s]").expect("Invalid regex"));

/// English stopwords dropped before keyword extraction.
pub static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "should", "now", "also", "would", "could",
    ]
    .into_iter()
    .collect()
});

/// Lowercases, strips everything but ASCII letters and whitespace, and
/// collapses runs of whitespace.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let letters = NON_ALPHA.replace_all(&lowered, "");
    letters.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops English stopwords from whitespace-separated text.
pub fn remove_stopwords(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !STOPWORDS.contains(word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleans each non-empty feature and joins them with single spaces.
pub fn combine_features(name: &str, cuisine: &str, description: &str, reviews: &str) -> String {
    [name, cuisine, description, reviews]
        .into_iter()
        .filter(|feature| !feature.trim().is_empty())
        .map(clean_text)
        .filter(|cleaned| !cleaned.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Default text extractor for the embedding store.
pub fn entity_text(entity: &Entity) -> String {
    combine_features(
        &entity.name,
        &entity.cuisine,
        &entity.description,
        &entity.reviews,
    )
}
