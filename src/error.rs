//! Error handling for the internship recommender

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid user profile: {0}")]
    InvalidUserProfile(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Model loading error: {0}")]
    ModelLoading(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, RecommenderError>;

/// model2vec reports load failures through anyhow
impl From<anyhow::Error> for RecommenderError {
    fn from(err: anyhow::Error) -> Self {
        RecommenderError::ModelLoading(err.to_string())
    }
}

impl RecommenderError {
    /// Row-level errors are recovered by skipping the row; everything else aborts the run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RecommenderError::MalformedRow { .. })
    }
}
