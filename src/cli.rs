//! CLI interface for the internship recommender

use crate::config::{EmbeddingBackend, OutputFormat};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "internship-recommender")]
#[command(about = "Recommend internships that fit a user profile")]
#[command(long_about = "Filter an internship dataset on your skills, score the rest on semantic similarity, skill overlap, location, stipend and deadline, and print the top matches")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Arguments of a recommendation run
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to the internship dataset (CSV)
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Path to the user profile (JSON)
    #[arg(short, long)]
    pub user: Option<PathBuf>,

    /// Number of recommendations to return
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Output format: json, console, markdown
    #[arg(short, long)]
    pub output: Option<String>,

    /// Save output to file instead of stdout
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    /// Embedding model name or Hugging Face repo id
    #[arg(short, long)]
    pub embedding: Option<String>,

    /// Embedding backend: model2vec, hashing
    #[arg(long)]
    pub backend: Option<String>,

    /// Embedding cache file
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Keep embeddings in memory only
    #[arg(long)]
    pub no_cache: bool,

    /// Ignore the existing cache file and embed everything again
    #[arg(long)]
    pub recompute_embeddings: bool,

    /// Drop listings farther away than this many kilometres
    #[arg(long)]
    pub max_distance_km: Option<f64>,

    /// Show a progress bar while scoring
    #[arg(long)]
    pub progress: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Embedding model management
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Inspect or clear the embedding cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available embedding models
    List,

    /// Download an embedding model
    Download {
        /// Model name or HuggingFace repo ID
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "scoring.weights.semantic")
        key: String,

        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show cache file statistics
    Stats,

    /// Delete the cache file
    Clear,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "json" => Ok(OutputFormat::Json),
        "console" | "text" => Ok(OutputFormat::Console),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!("Invalid output format: {}. Supported: json, console, markdown", format)),
    }
}

pub fn parse_backend(backend: &str) -> Result<EmbeddingBackend, String> {
    match backend.to_lowercase().as_str() {
        "model2vec" | "m2v" => Ok(EmbeddingBackend::Model2vec),
        "hashing" | "hash" => Ok(EmbeddingBackend::Hashing),
        _ => Err(format!("Invalid embedding backend: {}. Supported: model2vec, hashing", backend)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
