//! Hybrid restaurant recommendation.
//!
//! Exact `(city, cuisine)` filtering backed by a semantic nearest-neighbor
//! fallback, ranked by rating and vote count. The [`RetrievalEngine`] owns
//! the entity [`Catalog`], the embedding model and a persisted
//! [`EmbeddingStore`]; see [`retrieval`] for the query algorithm.

pub mod aspects;
pub mod assemble;
pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod retrieval;
pub mod store;
pub mod summary;
pub mod text;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use aspects::{AspectAnalyzer, AspectBreakdown, LexiconAspectAnalyzer};
pub use assemble::{Decoration, DecorationError, Recommendation, ResultAssembler};
pub use catalog::Catalog;
pub use config::Settings;
pub use error::{RecommendError, RecommendResult};
pub use retrieval::{RetrievalEngine, StoreOrigin};
pub use store::{EmbeddingStore, StoreMetadata, StoreSnapshot};
pub use summary::{SummaryGenerator, TemplateSummarizer};
pub use types::{Entity, EntityId, Quality, fold_key};
pub use vector::{
    EmbeddingGenerator, FastEmbedGenerator, FlatIndex, Neighbor, VectorDimension, VectorError,
};
