//! Configuration module for the recommendation engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DINERANK_` and use double
//! underscores to separate nested levels:
//! - `DINERANK_RETRIEVAL__TOP_K=10` sets `retrieval.top_k`
//! - `DINERANK_STORE__FORCE_REBUILD=true` sets `store.force_rebuild`
//! - `DINERANK_EMBEDDING__MODEL=BGESmallENV15` sets `embedding.model`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::vector::FastEmbedOptions;

/// Directory holding settings, the store and the model cache.
pub const WORKSPACE_DIR: &str = ".dinerank";

/// Placeholder substituted with the requested cuisine in the fallback query.
pub const CUISINE_PLACEHOLDER: &str = "{cuisine}";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Entity table settings
    #[serde(default)]
    pub data: DataConfig,

    /// Embedding store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Summary and aspect decoration settings
    #[serde(default)]
    pub decoration: DecorationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DataConfig {
    /// Cleaned dataset (JSON array or JSON Lines)
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Directory holding vectors, ids, index and metadata
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Ignore any persisted store and regenerate
    #[serde(default = "default_false")]
    pub force_rebuild: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// fastembed model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Texts per embedding batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Where downloaded models are cached
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Show a progress bar while downloading the model
    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Default number of results
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Fallback query text; `{cuisine}` is replaced with the requested cuisine
    #[serde(default = "default_query_template")]
    pub query_template: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DecorationConfig {
    /// Attach summaries and aspect breakdowns to results
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum aspects extracted per entity
    #[serde(default = "default_max_aspects")]
    pub max_aspects: usize,

    /// Average sentiment at or above this marks an aspect as a pro
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f32,

    /// Average sentiment at or below this marks an aspect as a con
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f32,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/restaurants.json")
}
fn default_store_path() -> PathBuf {
    PathBuf::from(WORKSPACE_DIR).join("store")
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(WORKSPACE_DIR).join("models")
}
fn default_top_k() -> usize {
    5
}
fn default_query_template() -> String {
    "Restaurant serving {cuisine} cuisine with {cuisine} dishes and {cuisine} flavors".to_string()
}
fn default_max_aspects() -> usize {
    5
}
fn default_positive_threshold() -> f32 {
    0.3
}
fn default_negative_threshold() -> f32 {
    -0.3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            data: DataConfig::default(),
            store: StoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            decoration: DecorationConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            force_rebuild: false,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            cache_dir: default_cache_dir(),
            show_download_progress: true,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            query_template: default_query_template(),
        }
    }
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_aspects: default_max_aspects(),
            positive_threshold: default_positive_threshold(),
            negative_threshold: default_negative_threshold(),
        }
    }
}

impl EmbeddingConfig {
    pub fn fastembed_options(&self) -> FastEmbedOptions {
        FastEmbedOptions {
            model_name: self.model.clone(),
            cache_dir: self.cache_dir.clone(),
            batch_size: self.batch_size,
            show_download_progress: self.show_download_progress,
        }
    }
}

impl RetrievalConfig {
    /// Fallback query text for `cuisine`.
    pub fn cuisine_query(&self, cuisine: &str) -> String {
        self.query_template.replace(CUISINE_PLACEHOLDER, cuisine.trim())
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(WORKSPACE_DIR).join("settings.toml"));

        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels; single
            // underscores stay inside field names
            .merge(Env::prefixed("DINERANK_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for a .dinerank directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(WORKSPACE_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(WORKSPACE_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# Dinerank Configuration File

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[data]
# Cleaned dataset: JSON array of rows or JSON Lines
dataset_path = "data/restaurants.json"

[store]
# Directory holding vectors, entity ids, the serialized index and metadata
path = ".dinerank/store"

# Ignore any persisted store and regenerate it on next load
force_rebuild = false

[embedding]
# fastembed model used for entities and fallback queries.
# Changing it invalidates the persisted store.
model = "AllMiniLML6V2"
batch_size = 32
cache_dir = ".dinerank/models"
show_download_progress = true

[retrieval]
# Default number of recommendations
top_k = 5

# Text embedded for the semantic fallback; {cuisine} is replaced
query_template = "Restaurant serving {cuisine} cuisine with {cuisine} dishes and {cuisine} flavors"

[decoration]
# Attach summaries and pros/cons to results
enabled = true
max_aspects = 5
positive_threshold = 0.3
negative_threshold = -0.3
"#;

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}
