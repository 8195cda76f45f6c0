//! CLI entry point for the restaurant recommender.
//!
//! Thin shell over the library: loads settings and the entity table, builds
//! or loads the embedding store, and prints recommendations as a table or
//! JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use dinerank::display::{THEME, create_recommendation_table, create_spinner, create_value_list};
use dinerank::{
    Catalog, FastEmbedGenerator, RecommendError, RetrievalEngine, Settings, StoreMetadata,
};
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Restaurant recommendations by city and cuisine
#[derive(Parser)]
#[command(
    name = "dinerank",
    version = env!("CARGO_PKG_VERSION"),
    about = "Restaurant recommendations by city and cuisine",
    long_about = "Recommend restaurants for a city and cuisine: exact matches first, \
                  semantic fallback when they run short, ranked by rating and votes.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset to load (overrides [data].dataset_path)
    #[arg(long, global = true, env = "DINERANK_DATASET")]
    dataset: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up .dinerank directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Build the embedding store, or verify and reuse an existing one
    Index {
        /// Regenerate even if a valid store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Recommend restaurants for a city and cuisine
    #[command(
        after_help = "Examples:\n  dinerank recommend Paris Italian\n  dinerank recommend \"New Delhi\" \"North Indian\" -k 10\n  dinerank recommend Rome italian --json | jq '.[].name'"
    )]
    Recommend {
        /// City to search in (case-insensitive)
        city: String,

        /// Cuisine to search for (case-insensitive)
        cuisine: String,

        /// Maximum number of results (overrides [retrieval].top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List cities in the dataset
    Cities,

    /// List cuisines in the dataset
    Cuisines {
        /// Only cuisines available in this city
        #[arg(long)]
        city: Option<String>,
    },

    /// Display active settings
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
        if let Some(err) = e.downcast_ref::<RecommendError>() {
            for suggestion in err.recovery_suggestions() {
                eprintln!("  {}", THEME.apply(&THEME.dim, suggestion));
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings(&cli)?;
    if let Some(dataset) = &cli.dataset {
        settings.data.dataset_path = dataset.clone();
    }
    init_tracing(cli.verbose || settings.debug);

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force).map_err(|e| anyhow!("{e}"))?;
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Created configuration file at: {}",
                    path.display()
                ))
            );
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("{}", THEME.apply(&THEME.header, "Current Configuration:"));
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Cities => {
            let catalog = load_catalog(&settings)?;
            println!("{}", create_value_list("City", &catalog.cities()));
        }

        Commands::Cuisines { city } => {
            let catalog = load_catalog(&settings)?;
            let cuisines = match &city {
                Some(city) => catalog.cuisines_in(city),
                None => catalog.cuisines(),
            };
            match (cuisines.is_empty(), &city) {
                (true, Some(city)) => {
                    println!("{}", THEME.warning_with_icon(&format!("No restaurants in {city}")));
                }
                _ => println!("{}", create_value_list("Cuisine", &cuisines)),
            }
        }

        Commands::Index { force } => {
            let engine = create_engine(&settings)?;
            let origin = engine
                .load_or_build(&settings.store.path, force || settings.store.force_rebuild)?;
            let count = engine.indexed_count().unwrap_or_default();
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Embedding store {origin}: {} entities at {}",
                    THEME.apply(&THEME.number, count),
                    THEME.apply(&THEME.path, settings.store.path.display())
                ))
            );
            if let Ok(metadata) = StoreMetadata::load(&settings.store.path) {
                println!(
                    "  model {} ({} dimensions)",
                    metadata.model_name, metadata.dimension
                );
            }
        }

        Commands::Recommend {
            city,
            cuisine,
            top_k,
            json,
        } => {
            let engine = create_engine(&settings)?;
            engine.load_or_build(&settings.store.path, settings.store.force_rebuild)?;

            let top_k = top_k.unwrap_or(settings.retrieval.top_k);
            let records = engine.recommend(&city, &cuisine, top_k)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!(
                    "{}",
                    THEME.warning_with_icon(&format!("No {cuisine} restaurants found in {city}"))
                );
            } else {
                println!("{}", create_recommendation_table(&records));
                for (rank, record) in records.iter().enumerate() {
                    let summary = record.summary_text();
                    if !summary.is_empty() {
                        println!("{}. {summary}", rank + 1);
                    }
                }
            }
        }
    }

    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.config {
        Some(path) => Settings::load_from(path)
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Configuration error loading from {}", path.display())),
        None => Settings::load()
            .map_err(|e| anyhow!("{e}"))
            .context("Configuration error"),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "warn,dinerank=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(settings: &Settings) -> Result<Catalog> {
    Ok(Catalog::load_json(&settings.data.dataset_path)?)
}

fn create_engine(settings: &Settings) -> Result<RetrievalEngine> {
    let catalog = load_catalog(settings)?;

    let spinner = create_spinner(&format!(
        "Loading embedding model {}",
        settings.embedding.model
    ));
    let generator = FastEmbedGenerator::new(&settings.embedding.fastembed_options());
    spinner.finish_and_clear();
    let generator = generator.map_err(RecommendError::from)?;

    Ok(
        RetrievalEngine::new(Arc::new(catalog), Arc::new(generator), settings.clone())
            .with_progress(true),
    )
}
