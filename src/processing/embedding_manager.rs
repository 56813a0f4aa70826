//! Embedding model management for downloading and locating Model2Vec models

use crate::config::{AvailableModel, Config};
use crate::error::{RecommenderError, Result};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Files a Model2Vec directory must contain to be loadable
const REQUIRED_FILES: &[&str] = &["model.safetensors", "tokenizer.json", "config.json"];
const OPTIONAL_FILES: &[&str] = &["README.md"];

/// Manager for embedding models - handles download, lookup, and listing
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: Vec<AvailableModel>,
    downloaded_models: HashSet<String>,
}

impl EmbeddingModelManager {
    pub async fn new(config: &Config) -> Result<Self> {
        Self::with_catalog(config.models.models_dir.clone(), config.models.available_models.clone()).await
    }

    pub async fn with_catalog(models_dir: PathBuf, available_models: Vec<AvailableModel>) -> Result<Self> {
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await.map_err(|e| {
                RecommenderError::ModelLoading(format!("Failed to create models directory: {}", e))
            })?;
        }

        let mut manager = Self {
            models_dir,
            available_models,
            downloaded_models: HashSet::new(),
        };
        manager.scan_downloaded_models().await?;
        Ok(manager)
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await.map_err(|e| {
            RecommenderError::ModelLoading(format!("Failed to scan models directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() && Self::is_model_directory(&entry.path()).await {
                self.downloaded_models
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        Ok(())
    }

    async fn is_model_directory(path: &Path) -> bool {
        for file in REQUIRED_FILES {
            if fs::metadata(path.join(file)).await.is_err() {
                return false;
            }
        }
        true
    }

    /// Resolve a catalog name, repo id, or case-insensitive name to a catalog name
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        let input_lower = input.to_lowercase();
        self.available_models
            .iter()
            .find(|m| m.name == input || m.repo_id == input)
            .or_else(|| {
                self.available_models
                    .iter()
                    .find(|m| m.name.to_lowercase() == input_lower)
            })
            .map(|m| m.name.clone())
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&AvailableModel> {
        self.available_models.iter().find(|m| m.name == model_id)
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded_models.contains(model_id)
    }

    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        self.is_model_downloaded(model_id)
            .then(|| self.models_dir.join(model_id))
    }

    pub fn list_available_models(&self) -> &[AvailableModel] {
        &self.available_models
    }

    pub fn list_downloaded_models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.downloaded_models.iter().cloned().collect();
        models.sort();
        models
    }

    /// Local path for a model, downloading it first when it is missing.
    ///
    /// An existing directory containing model files is used as-is even when
    /// the model is not in the catalog.
    pub async fn ensure_model_available(&mut self, model: &str) -> Result<PathBuf> {
        let local = Path::new(model);
        if local.is_dir() && Self::is_model_directory(local).await {
            return Ok(local.to_path_buf());
        }

        let model_id = self.resolve_model_id(model).ok_or_else(|| {
            RecommenderError::ModelLoading(format!(
                "Unknown embedding model '{}'. Run `models list` to see available models",
                model
            ))
        })?;

        if let Some(path) = self.get_model_path(&model_id) {
            return Ok(path);
        }

        self.download_model(&model_id, false).await
    }

    /// Download a catalog model from the Hugging Face Hub into the models directory
    pub async fn download_model(&mut self, model_id: &str, force: bool) -> Result<PathBuf> {
        let model_info = self
            .get_model_info(model_id)
            .cloned()
            .ok_or_else(|| RecommenderError::ModelLoading(format!("Unknown embedding model: {}", model_id)))?;

        let model_dir = self.models_dir.join(&model_info.name);
        if !force && self.is_model_downloaded(&model_info.name) {
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model {} ({} MB) from {}",
            model_info.name, model_info.size_mb, model_info.repo_id
        );

        fs::create_dir_all(&model_dir).await.map_err(|e| {
            RecommenderError::ModelLoading(format!("Failed to create model directory: {}", e))
        })?;

        let api = Api::new().map_err(|e| {
            RecommenderError::ModelLoading(format!("Failed to initialize HF API: {}", e))
        })?;
        let repo = api.model(model_info.repo_id.clone());

        for file in REQUIRED_FILES.iter().chain(OPTIONAL_FILES) {
            match repo.get(file).await {
                Ok(cached_path) => {
                    fs::copy(&cached_path, model_dir.join(file)).await.map_err(|e| {
                        RecommenderError::ModelLoading(format!("Failed to copy {}: {}", file, e))
                    })?;
                    info!("  Downloaded: {}", file);
                }
                Err(e) if OPTIONAL_FILES.contains(file) => {
                    warn!("  Optional file {} not found: {}", file, e);
                }
                Err(e) => {
                    return Err(RecommenderError::ModelLoading(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )));
                }
            }
        }

        self.downloaded_models.insert(model_info.name.clone());
        info!("Embedding model {} downloaded", model_info.name);
        Ok(model_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn manager(dir: &TempDir) -> EmbeddingModelManager {
        EmbeddingModelManager::with_catalog(
            dir.path().join("models"),
            crate::config::ModelConfig::default().available_models,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_manager_creates_models_dir() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir).await;
        assert!(temp_dir.path().join("models").is_dir());
        assert_eq!(manager.list_available_models().len(), 3);
        assert!(manager.list_downloaded_models().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_model_id() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir).await;

        assert_eq!(manager.resolve_model_id("potion-base-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(
            manager.resolve_model_id("minishlab/potion-base-8M"),
            Some("potion-base-8M".to_string())
        );
        assert_eq!(manager.resolve_model_id("POTION-BASE-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(manager.resolve_model_id("bert-large"), None);
    }

    #[tokio::test]
    async fn test_scan_finds_complete_model_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let models_dir = temp_dir.path().join("models");

        let complete = models_dir.join("potion-base-8M");
        std::fs::create_dir_all(&complete).unwrap();
        std::fs::write(complete.join("model.safetensors"), b"weights").unwrap();
        std::fs::write(complete.join("tokenizer.json"), b"{}").unwrap();
        std::fs::write(complete.join("config.json"), b"{}").unwrap();

        let partial = models_dir.join("m2v-base");
        std::fs::create_dir_all(&partial).unwrap();
        std::fs::write(partial.join("tokenizer.json"), b"{}").unwrap();

        let no_config = models_dir.join("potion-retrieval-32M");
        std::fs::create_dir_all(&no_config).unwrap();
        std::fs::write(no_config.join("model.safetensors"), b"weights").unwrap();
        std::fs::write(no_config.join("tokenizer.json"), b"{}").unwrap();

        let mut manager = manager(&temp_dir).await;
        assert_eq!(manager.list_downloaded_models(), vec!["potion-base-8M".to_string()]);
        assert_eq!(manager.get_model_path("m2v-base"), None);
        assert!(!manager.is_model_downloaded("potion-retrieval-32M"));
        assert_eq!(manager.get_model_path("potion-retrieval-32M"), None);

        let path = manager.ensure_model_available("minishlab/potion-base-8M").await.unwrap();
        assert_eq!(path, complete);

        let direct = manager.ensure_model_available(complete.to_str().unwrap()).await.unwrap();
        assert_eq!(direct, complete);
    }

    #[tokio::test]
    async fn test_unknown_model_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager(&temp_dir).await;
        assert!(matches!(
            manager.ensure_model_available("no-such-model").await,
            Err(RecommenderError::ModelLoading(_))
        ));
    }
}
