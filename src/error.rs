//! Error types for the recommendation engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::vector::VectorError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for store and retrieval operations
#[derive(Error, Debug)]
pub enum RecommendError {
    /// Retrieval was invoked before a store was built or loaded
    #[error(
        "Recommender is not initialized\nSuggestion: Call load_or_build() (or run 'dinerank index') before querying"
    )]
    NotInitialized,

    /// Query vector disagrees with the index dimension (model/version skew)
    #[error(
        "Embedding dimension mismatch: index expects {expected}, query has {actual}\nSuggestion: The store was built with a different embedding model; rebuild it with --force"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted artifacts are missing or inconsistent
    #[error("Embedding store at '{path}' is unusable: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    /// Embedding model failures
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Entity table errors
    #[error("Failed to load entities from '{path}': {reason}")]
    DataLoad { path: PathBuf, reason: String },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error(transparent)]
    Vector(VectorError),
}

impl From<VectorError> for RecommendError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            VectorError::EmbeddingFailed(reason) => Self::Embedding(reason),
            other => Self::Vector(other),
        }
    }
}

impl RecommendError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StoreCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::StoreCorrupt { .. } => "STORE_CORRUPT",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::DataLoad { .. } => "DATA_LOAD_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Vector(_) => "VECTOR_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::NotInitialized => vec![
                "Build or load the embedding store before calling recommend",
                "From the CLI, run 'dinerank index' once",
            ],
            Self::DimensionMismatch { .. } => vec![
                "Run 'dinerank index --force' to rebuild with the configured model",
                "Check that [embedding].model matches the model used at build time",
            ],
            Self::StoreCorrupt { .. } => vec![
                "The store will be regenerated on the next load_or_build",
                "Delete the store directory if the problem persists",
            ],
            Self::Embedding(_) => vec![
                "Ensure you have internet connection for first-time model download",
                "Check that the configured model name is supported",
            ],
            Self::DataLoad { .. } => vec![
                "Check that the dataset file exists and is valid JSON or JSON Lines",
                "Every row needs a city and a cuisine",
            ],
            Self::Io { .. } => vec!["Check disk space and file permissions"],
            _ => vec![],
        }
    }
}

/// Result type alias for recommendation operations
pub type RecommendResult<T> = Result<T, RecommendError>;
