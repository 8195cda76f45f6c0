//! Hydrates ranked entity ids into result records.
//!
//! Assembly never reorders or filters. Each optional decoration is carried
//! as a [`Decoration`], so a failed summary or aspect analysis is a visible
//! state on the record instead of a dropped result.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::aspects::{AspectAnalyzer, AspectBreakdown, LexiconAspectAnalyzer};
use crate::catalog::Catalog;
use crate::config::DecorationConfig;
use crate::summary::{SummaryGenerator, TemplateSummarizer};
use crate::types::{Entity, EntityId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecorationError {
    #[error("Summary generation failed: {0}")]
    Summary(String),

    #[error("Aspect analysis failed: {0}")]
    Aspects(String),
}

/// Outcome of one optional decoration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Decoration<T> {
    Ready(T),
    /// Nothing to decorate from, or decoration is switched off.
    Empty,
    /// The collaborator failed; the reason is kept for display and logs.
    Failed(String),
}

impl<T> Decoration<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Empty | Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    fn from_result(result: Result<T, DecorationError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// One recommended entity with its display decorations.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub entity: Entity,
    pub summary: Decoration<String>,
    pub aspects: Decoration<AspectBreakdown>,
}

impl Recommendation {
    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    /// Summary text, or an empty string when no summary is available.
    pub fn summary_text(&self) -> &str {
        self.summary.ready().map(String::as_str).unwrap_or_default()
    }

    pub fn pros(&self) -> &[String] {
        self.aspects
            .ready()
            .map(|breakdown| breakdown.pros.as_slice())
            .unwrap_or_default()
    }

    pub fn cons(&self) -> &[String] {
        self.aspects
            .ready()
            .map(|breakdown| breakdown.cons.as_slice())
            .unwrap_or_default()
    }

    pub fn aspect_sentiments(&self) -> BTreeMap<String, f32> {
        self.aspects
            .ready()
            .map(|breakdown| breakdown.aspect_sentiments.clone())
            .unwrap_or_default()
    }
}

pub struct ResultAssembler {
    summarizer: Box<dyn SummaryGenerator>,
    analyzer: Box<dyn AspectAnalyzer>,
    enabled: bool,
}

impl std::fmt::Debug for ResultAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultAssembler")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::from_config(&DecorationConfig::default())
    }
}

impl ResultAssembler {
    pub fn new(
        summarizer: Box<dyn SummaryGenerator>,
        analyzer: Box<dyn AspectAnalyzer>,
    ) -> Self {
        Self {
            summarizer,
            analyzer,
            enabled: true,
        }
    }

    /// Template summaries and lexicon aspects, tuned by `config`.
    pub fn from_config(config: &DecorationConfig) -> Self {
        Self {
            summarizer: Box::new(TemplateSummarizer),
            analyzer: Box::new(LexiconAspectAnalyzer::from_config(config)),
            enabled: config.enabled,
        }
    }

    /// Records for `ids` in the given order. Ids missing from the catalog
    /// are skipped.
    pub fn assemble(&self, catalog: &Catalog, ids: &[EntityId]) -> Vec<Recommendation> {
        ids.iter()
            .filter_map(|&id| {
                let entity = catalog.get(id);
                if entity.is_none() {
                    tracing::warn!(%id, "ranked id is not in the catalog");
                }
                entity
            })
            .map(|entity| self.decorate(entity))
            .collect()
    }

    pub fn decorate(&self, entity: &Entity) -> Recommendation {
        if !self.enabled {
            return Recommendation {
                entity: entity.clone(),
                summary: Decoration::Empty,
                aspects: Decoration::Empty,
            };
        }

        let summary = match self.summarizer.summarize(entity) {
            Ok(text) if text.is_empty() => Decoration::Empty,
            result => Decoration::from_result(result),
        };

        let review_text = entity.review_text();
        let aspects = if review_text.trim().is_empty() {
            Decoration::Empty
        } else {
            Decoration::from_result(self.analyzer.analyze(review_text))
        };

        for (name, failed) in [("summary", summary.is_failed()), ("aspects", aspects.is_failed())] {
            if failed {
                tracing::warn!(id = %entity.id, decoration = name, "decoration failed");
            }
        }

        Recommendation {
            entity: entity.clone(),
            summary,
            aspects,
        }
    }
}
