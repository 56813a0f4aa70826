//! Configuration management for the internship recommender

use crate::error::{RecommenderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub models: ModelConfig,
    pub scoring: ScoringConfig,
    pub explain: ExplainConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub dataset: PathBuf,
    pub user_profile: PathBuf,
    pub cache_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub backend: EmbeddingBackend,
    pub default_embedding_model: String,
    pub hashing_dimension: usize,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub dimensions: usize,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Static Model2Vec model loaded from the models directory
    Model2vec,
    /// Offline feature-hashing embedder, no model files required
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub top_k: usize,
    pub min_skill_matches: usize,
    pub fuzzy_threshold: f64,
    pub remote_credit: f64,
    pub location_radius_km: f64,
    pub empty_skills: EmptySkillPolicy,
    pub expired_deadline: DeadlinePolicy,
    pub embedding_failure: EmbeddingFailurePolicy,
    pub weights: ScoringWeights,
}

/// Weight of each component in the final score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub skill: f64,
    pub location: f64,
    pub stipend: f64,
    pub deadline: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySkillPolicy {
    /// A profile without skills matches nothing
    RejectAll,
    /// A profile without skills skips the hard filter
    PassAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlinePolicy {
    /// Expired listings stay in the ranking with a zero deadline score
    ScoreZero,
    /// Expired listings are removed before scoring
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFailurePolicy {
    /// Failed embeddings contribute a zero semantic score
    ZeroScore,
    /// Failed embeddings abort the run
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub semantic_high: f64,
    pub semantic_good: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Console,
    Markdown,
}

fn app_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".internship-recommender")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("dataset/internships.csv"),
            user_profile: PathBuf::from("user.json"),
            cache_path: app_home().join("embeddings.json"),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            models_dir: app_home().join("models"),
            backend: EmbeddingBackend::Model2vec,
            default_embedding_model: "potion-base-8M".to_string(),
            hashing_dimension: 256,
            available_models: vec![
                AvailableModel {
                    name: "potion-base-8M".to_string(),
                    repo_id: "minishlab/potion-base-8M".to_string(),
                    size_mb: 33,
                    dimensions: 256,
                    description: "Compact Model2Vec embeddings, good default".to_string(),
                },
                AvailableModel {
                    name: "m2v-base".to_string(),
                    repo_id: "minishlab/M2V_base_output".to_string(),
                    size_mb: 90,
                    dimensions: 256,
                    description: "Legacy Model2Vec base embeddings model".to_string(),
                },
                AvailableModel {
                    name: "potion-retrieval-32M".to_string(),
                    repo_id: "minishlab/potion-retrieval-32M".to_string(),
                    size_mb: 130,
                    dimensions: 512,
                    description: "Larger Model2Vec model tuned for retrieval".to_string(),
                },
            ],
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_skill_matches: 1,
            fuzzy_threshold: 0.85,
            remote_credit: 0.8,
            location_radius_km: 50.0,
            empty_skills: EmptySkillPolicy::RejectAll,
            expired_deadline: DeadlinePolicy::ScoreZero,
            embedding_failure: EmbeddingFailurePolicy::ZeroScore,
            weights: ScoringWeights::default(),
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.50,
            skill: 0.20,
            location: 0.15,
            stipend: 0.08,
            deadline: 0.07,
        }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            semantic_high: 0.7,
            semantic_good: 0.5,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            color_output: true,
            pretty_json: true,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.semantic + self.skill + self.location + self.stipend + self.deadline
    }

    fn as_array(&self) -> [f64; 5] {
        [self.semantic, self.skill, self.location, self.stipend, self.deadline]
    }

    /// Reject weights that cannot be normalized into a convex combination
    pub fn validate(&self) -> Result<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RecommenderError::Configuration(format!(
                "Scoring weights must be finite and non-negative: {:?}",
                self
            )));
        }
        if self.sum() <= 0.0 {
            return Err(RecommenderError::Configuration(
                "Scoring weights must not all be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Scale the weights so they sum to 1
    pub fn normalized(&self) -> Result<Self> {
        self.validate()?;
        let total = self.sum();
        Ok(Self {
            semantic: self.semantic / total,
            skill: self.skill / total,
            location: self.location / total,
            stipend: self.stipend / total,
            deadline: self.deadline / total,
        })
    }
}

impl Config {
    /// Load the user configuration, writing defaults on first use
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RecommenderError::MissingFile(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            RecommenderError::Configuration(format!(
                "Failed to parse config {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            RecommenderError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("internship-recommender")
            .join("config.toml")
    }

    /// Check every value a run depends on
    pub fn validate(&self) -> Result<()> {
        self.scoring.weights.validate()?;

        let unit_values = [
            ("scoring.fuzzy_threshold", self.scoring.fuzzy_threshold),
            ("scoring.remote_credit", self.scoring.remote_credit),
            ("explain.semantic_high", self.explain.semantic_high),
            ("explain.semantic_good", self.explain.semantic_good),
        ];
        for (key, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                return Err(RecommenderError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    key, value
                )));
            }
        }

        if !(self.scoring.location_radius_km.is_finite() && self.scoring.location_radius_km > 0.0) {
            return Err(RecommenderError::Configuration(format!(
                "scoring.location_radius_km must be positive, got {}",
                self.scoring.location_radius_km
            )));
        }

        if self.explain.semantic_good > self.explain.semantic_high {
            return Err(RecommenderError::Configuration(
                "explain.semantic_good must not exceed explain.semantic_high".to_string(),
            ));
        }

        if self.models.hashing_dimension == 0 {
            return Err(RecommenderError::Configuration(
                "models.hashing_dimension must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&AvailableModel> {
        self.models
            .available_models
            .iter()
            .find(|m| m.name == name || m.repo_id == name)
    }

    /// Apply a `section.key=value` override, as used by `config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut table = toml::Value::try_from(&*self).map_err(|e| {
            RecommenderError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        let (section, field) = key.split_once('.').ok_or_else(|| {
            RecommenderError::Configuration(format!("Expected section.key, got '{}'", key))
        })?;

        let mut target = table
            .get_mut(section)
            .ok_or_else(|| RecommenderError::Configuration(format!("Unknown section '{}'", section)))?;

        let mut parts = field.split('.').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let slot = target.get_mut(part).ok_or_else(|| {
                    RecommenderError::Configuration(format!("Unknown key '{}'", key))
                })?;
                *slot = parse_like(slot, value)?;
            } else {
                target = target.get_mut(part).ok_or_else(|| {
                    RecommenderError::Configuration(format!("Unknown key '{}'", key))
                })?;
            }
        }

        *self = table.try_into().map_err(|e| {
            RecommenderError::Configuration(format!("Invalid value for '{}': {}", key, e))
        })?;
        Ok(())
    }
}

/// Parse a raw override using the type of the value it replaces
fn parse_like(current: &toml::Value, raw: &str) -> Result<toml::Value> {
    let invalid = |kind: &str| {
        RecommenderError::Configuration(format!("Expected {} value, got '{}'", kind, raw))
    };
    Ok(match current {
        toml::Value::Integer(_) => toml::Value::Integer(raw.parse().map_err(|_| invalid("an integer"))?),
        toml::Value::Float(_) => toml::Value::Float(raw.parse().map_err(|_| invalid("a float"))?),
        toml::Value::Boolean(_) => toml::Value::Boolean(raw.parse().map_err(|_| invalid("a boolean"))?),
        _ => toml::Value::String(raw.to_string()),
    })
}
