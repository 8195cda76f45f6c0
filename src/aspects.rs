//! Aspect extraction and pros/cons from review text.
//!
//! Candidate aspects are the most frequent unigrams and bigrams of the text.
//! Each sentence gets a compound polarity score from a small valence lexicon;
//! an aspect's sentiment is the mean score of the sentences mentioning it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::assemble::DecorationError;
use crate::config::DecorationConfig;
use crate::text::STOPWORDS;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("Invalid regex"));
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]+\b").expect("Invalid regex"));
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+\s*").expect("Invalid regex"));
static SENTIMENT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]+(?:'[a-zA-Z]+)?").expect("Invalid regex"));

/// Normalisation constant for the compound score.
const ALPHA: f32 = 15.0;
/// Scalar applied to a valence preceded by a negation.
const NEGATION_SCALAR: f32 = -0.74;
const BOOSTER_INCREMENT: f32 = 0.293;
/// How many preceding tokens a negation reaches.
const NEGATION_WINDOW: usize = 3;

/// Word valences on a -4..=4 scale.
static LEXICON: LazyLock<HashMap<&'static str, f32>> = LazyLock::new(|| {
    [
        ("amazing", 2.8),
        ("awesome", 3.1),
        ("beautiful", 2.9),
        ("best", 3.2),
        ("bland", -1.6),
        ("bad", -2.5),
        ("boring", -1.3),
        ("broken", -1.9),
        ("charming", 2.2),
        ("cheap", 0.5),
        ("clean", 1.7),
        ("cold", -0.6),
        ("comfortable", 1.9),
        ("cosy", 1.8),
        ("cozy", 1.8),
        ("crowded", -1.3),
        ("delicious", 2.7),
        ("delight", 2.9),
        ("delightful", 2.8),
        ("dirty", -1.9),
        ("disappointed", -1.9),
        ("disappointing", -2.2),
        ("disgusting", -2.9),
        ("enjoy", 2.2),
        ("enjoyed", 2.3),
        ("excellent", 2.7),
        ("expensive", -0.9),
        ("fantastic", 2.6),
        ("fast", 0.6),
        ("favorite", 2.0),
        ("favourite", 2.0),
        ("fine", 0.8),
        ("fresh", 1.3),
        ("friendly", 2.2),
        ("generous", 2.3),
        ("good", 1.9),
        ("gorgeous", 3.0),
        ("great", 3.1),
        ("greasy", -1.2),
        ("happy", 2.7),
        ("helpful", 1.8),
        ("horrible", -2.5),
        ("hot", 0.4),
        ("impressive", 2.3),
        ("inedible", -2.4),
        ("love", 3.2),
        ("loved", 2.9),
        ("lovely", 2.8),
        ("mediocre", -1.3),
        ("nice", 1.8),
        ("noisy", -1.1),
        ("overcooked", -1.5),
        ("overpriced", -1.8),
        ("perfect", 2.7),
        ("pleasant", 2.3),
        ("poor", -2.1),
        ("professional", 1.6),
        ("recommend", 1.5),
        ("recommended", 1.8),
        ("rude", -2.0),
        ("salty", -0.8),
        ("slow", -1.1),
        ("smelly", -1.6),
        ("stale", -1.8),
        ("superb", 3.1),
        ("tasteless", -1.9),
        ("tasty", 2.1),
        ("terrible", -2.1),
        ("unfriendly", -1.8),
        ("unpleasant", -2.1),
        ("wonderful", 2.7),
        ("worse", -2.1),
        ("worst", -3.1),
        ("yummy", 2.4),
    ]
    .into_iter()
    .collect()
});

static NEGATIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "not", "no", "never", "nothing", "nowhere", "none", "neither", "nor", "without", "hardly",
        "barely", "isn't", "wasn't", "aren't", "weren't", "don't", "doesn't", "didn't", "won't",
        "wouldn't", "can't", "cannot", "couldn't", "shouldn't", "ain't",
    ]
    .into_iter()
    .collect()
});

static BOOSTERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "very", "really", "extremely", "incredibly", "so", "absolutely", "super", "truly",
        "totally", "highly",
    ]
    .into_iter()
    .collect()
});

/// Aspects of one review text with their sentiment split.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AspectBreakdown {
    /// Candidate aspects, most salient first.
    pub aspects: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    /// Mean compound score per aspect; 0.0 when no sentence mentions it.
    pub aspect_sentiments: BTreeMap<String, f32>,
}

impl AspectBreakdown {
    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }
}

pub trait AspectAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<AspectBreakdown, DecorationError>;
}

#[derive(Debug, Clone)]
pub struct LexiconAspectAnalyzer {
    max_aspects: usize,
    positive_threshold: f32,
    negative_threshold: f32,
}

impl Default for LexiconAspectAnalyzer {
    fn default() -> Self {
        Self::from_config(&DecorationConfig::default())
    }
}

impl LexiconAspectAnalyzer {
    pub fn from_config(config: &DecorationConfig) -> Self {
        Self {
            max_aspects: config.max_aspects,
            positive_threshold: config.positive_threshold,
            negative_threshold: config.negative_threshold,
        }
    }

    /// Most frequent unigrams and bigrams, bigrams first.
    pub fn candidate_aspects(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let spaced = PUNCTUATION.replace_all(&lowered, " ");
        let tokens: Vec<&str> = WORD
            .find_iter(&spaced)
            .map(|m| m.as_str())
            .filter(|token| token.len() > 2 && !STOPWORDS.contains(token))
            .collect();

        let bigrams = tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));
        let terms: Vec<String> = tokens
            .iter()
            .map(|token| token.to_string())
            .chain(bigrams)
            .collect();

        // Count in first-seen order so equal counts keep text order
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for term in &terms {
            let count = counts.entry(term.as_str()).or_insert(0);
            if *count == 0 {
                order.push(term.as_str());
            }
            *count += 1;
        }
        order.sort_by(|a, b| counts[b].cmp(&counts[a]));
        order.truncate(self.max_aspects * 2);

        let (bigrams, unigrams): (Vec<&str>, Vec<&str>) =
            order.into_iter().partition(|term| term.contains(' '));

        let mut seen = HashSet::new();
        bigrams
            .into_iter()
            .chain(unigrams)
            .filter(|term| seen.insert(*term))
            .take(self.max_aspects)
            .map(str::to_string)
            .collect()
    }
}

impl AspectAnalyzer for LexiconAspectAnalyzer {
    fn analyze(&self, text: &str) -> Result<AspectBreakdown, DecorationError> {
        if text.trim().is_empty() {
            return Ok(AspectBreakdown::default());
        }

        let aspects = self.candidate_aspects(text);
        let mut scores: Vec<Vec<f32>> = vec![Vec::new(); aspects.len()];

        for sentence in SENTENCE_BREAK.split(text).filter(|s| !s.trim().is_empty()) {
            let score = compound_score(sentence);
            let lowered = sentence.to_lowercase();
            for (aspect, bucket) in aspects.iter().zip(scores.iter_mut()) {
                if lowered.contains(aspect.as_str()) {
                    bucket.push(score);
                }
            }
        }

        let mut breakdown = AspectBreakdown {
            aspects: aspects.clone(),
            ..AspectBreakdown::default()
        };
        for (aspect, bucket) in aspects.into_iter().zip(scores) {
            let mean = if bucket.is_empty() {
                0.0
            } else {
                bucket.iter().sum::<f32>() / bucket.len() as f32
            };
            if !mean.is_finite() {
                return Err(DecorationError::Aspects(format!(
                    "non-finite sentiment for '{aspect}'"
                )));
            }

            if mean >= self.positive_threshold {
                breakdown.pros.push(aspect.clone());
            } else if mean <= self.negative_threshold {
                breakdown.cons.push(aspect.clone());
            }
            breakdown.aspect_sentiments.insert(aspect, mean);
        }

        Ok(breakdown)
    }
}

/// Sentence polarity in `[-1, 1]`.
pub fn compound_score(sentence: &str) -> f32 {
    let lowered = sentence.to_lowercase();
    let tokens: Vec<&str> = SENTIMENT_TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .collect();

    let mut total = 0.0;
    for (i, token) in tokens.iter().enumerate() {
        let Some(&valence) = LEXICON.get(token) else {
            continue;
        };

        let mut valence = valence;
        if i > 0 && BOOSTERS.contains(tokens[i - 1]) {
            valence += BOOSTER_INCREMENT * valence.signum();
        }
        let window = &tokens[i.saturating_sub(NEGATION_WINDOW)..i];
        if window.iter().any(|t| NEGATIONS.contains(t) || t.ends_with("n't")) {
            valence *= NEGATION_SCALAR;
        }
        total += valence;
    }

    let normalized = total / (total * total + ALPHA).sqrt();
    normalized.clamp(-1.0, 1.0)
}
