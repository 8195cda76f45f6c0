//! Embedding generation for entity texts and cuisine queries.
//!
//! This module provides the trait and implementations for generating
//! vector embeddings from text. The production implementation uses
//! fastembed, defaulting to the AllMiniLML6V2 model.

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use crate::vector::{VectorDimension, VectorError};

/// Trait for generating embeddings from text.
///
/// Implementations must be deterministic for a given model version and
/// thread-safe, since one generator is shared by the store builder and
/// every query.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts, one per input, in order.
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Name recorded in store metadata to detect model skew.
    fn model_name(&self) -> &str;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.generate_embeddings(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| {
                VectorError::EmbeddingFailed("Model returned no embedding for input".to_string())
            })
    }
}

/// FastEmbed implementation.
///
/// The output dimension is discovered once at construction by embedding a
/// probe string, and every later batch is validated against it.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: VectorDimension,
    batch_size: usize,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .field("model", &"<TextEmbedding>")
            .finish()
    }
}

/// Options for constructing a [`FastEmbedGenerator`].
#[derive(Debug, Clone)]
pub struct FastEmbedOptions {
    pub model_name: String,
    pub cache_dir: PathBuf,
    pub batch_size: usize,
    pub show_download_progress: bool,
}

impl FastEmbedGenerator {
    /// Create a new FastEmbed generator.
    ///
    /// # Errors
    /// Returns an error if the model name is unknown or the model fails to
    /// initialize or download.
    pub fn new(options: &FastEmbedOptions) -> Result<Self, VectorError> {
        let model = parse_embedding_model(&options.model_name)?;

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(options.cache_dir.clone())
                .with_show_download_progress(options.show_download_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(
            format!("Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        let probe = text_model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| VectorError::EmbeddingFailed(format!("Failed to probe model: {e}")))?;
        let dimension = probe
            .first()
            .map(|embedding| embedding.len())
            .ok_or_else(|| VectorError::EmbeddingFailed("Model produced no probe output".to_string()))?;

        tracing::info!(
            model = %options.model_name,
            dimension,
            "embedding model ready"
        );

        Ok(Self {
            model: Mutex::new(text_model),
            model_name: options.model_name.clone(),
            dimension: VectorDimension::new(dimension)?,
            batch_size: options.batch_size.max(1),
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // fastembed expects owned strings for the embed method
        let text_strings: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();

        let embeddings = self
            .model
            .lock()
            .embed(text_strings, Some(self.batch_size))
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Resolve a configured model name to a fastembed model.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        "BGELargeENV15" => Ok(EmbeddingModel::BGELargeENV15),
        "MultilingualE5Small" => Ok(EmbeddingModel::MultilingualE5Small),
        "ParaphraseMLMiniLML12V2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
        "NomicEmbedTextV15" => Ok(EmbeddingModel::NomicEmbedTextV15),
        other => Err(VectorError::EmbeddingFailed(format!(
            "Unknown embedding model '{other}'. Supported: AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15, BGELargeENV15, MultilingualE5Small, ParaphraseMLMiniLML12V2, NomicEmbedTextV15"
        ))),
    }
}

/// Mock embedding generator for testing.
///
/// Generates deterministic embeddings based on cuisine keywords in the text,
/// so that texts mentioning the same cuisine land close together.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
}

#[cfg(test)]
impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    /// Create a new mock generator with a small dimension.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::new(16).unwrap(),
        }
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        const KEYWORDS: [&str; 6] = ["italian", "pizza", "japanese", "sushi", "indian", "curry"];
        let dim = self.dimension.get();

        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut embedding = vec![0.1; dim];
                for (slot, keyword) in KEYWORDS.iter().enumerate() {
                    if slot < dim && lower.contains(keyword) {
                        embedding[slot] = 0.9;
                    }
                }
                // Normalize to unit length (like real embeddings)
                let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                embedding.iter().map(|v| v / magnitude).collect()
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
