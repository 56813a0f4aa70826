//! Persisted embedding cache keyed by a hash of the embedded text

use crate::error::{RecommenderError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One cached embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    model: String,
    dimension: usize,
    entries: Vec<CacheEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub model: String,
}

/// Summary of a cache file on disk
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSummary {
    pub model: String,
    pub dimension: usize,
    pub entries: usize,
    pub size_bytes: u64,
}

/// Embeddings keyed by SHA-256 of their text.
///
/// Loaded once at the start of a run and flushed once at the end. Entries are
/// never evicted; a different text simply produces a different key.
pub struct EmbeddingCache {
    path: Option<PathBuf>,
    model: String,
    dimension: usize,
    entries: HashMap<String, Vec<f32>>,
    dirty: bool,
    hits: usize,
    misses: usize,
}

impl EmbeddingCache {
    pub fn key_for(text: &str) -> String {
        format!("{:x}", Sha256::digest(text.as_bytes()))
    }

    /// A cache that is never written to disk
    pub fn in_memory(model: &str, dimension: usize) -> Self {
        Self {
            path: None,
            model: model.to_string(),
            dimension,
            entries: HashMap::new(),
            dirty: false,
            hits: 0,
            misses: 0,
        }
    }

    /// Start empty but flush to `path`, replacing whatever is there
    pub fn fresh(path: &Path, model: &str, dimension: usize) -> Self {
        let mut cache = Self::in_memory(model, dimension);
        cache.path = Some(path.to_path_buf());
        cache
    }

    /// Load a cache file written for `model`.
    ///
    /// A missing file starts an empty cache. An unreadable file, or one
    /// written by a different model, is discarded with a warning.
    pub fn load(path: &Path, model: &str, dimension: usize) -> Result<Self> {
        let mut cache = Self::fresh(path, model, dimension);
        if !path.exists() {
            debug!("No embedding cache at {}, starting empty", path.display());
            return Ok(cache);
        }

        let content = fs::read(path)?;
        let file: CacheFile = match serde_json::from_slice(&content) {
            Ok(file) => file,
            Err(e) => {
                warn!("Ignoring unreadable embedding cache {}: {}", path.display(), e);
                return Ok(cache);
            }
        };

        if file.model != model || file.dimension != dimension {
            warn!(
                "Embedding cache {} was written by {} ({} dims), current model is {} ({} dims); starting empty",
                path.display(),
                file.model,
                file.dimension,
                model,
                dimension
            );
            cache.dirty = true;
            return Ok(cache);
        }

        let total = file.entries.len();
        cache.entries = file
            .entries
            .into_iter()
            .filter(|entry| entry.embedding.len() == dimension)
            .map(|entry| (entry.key, entry.embedding))
            .collect();

        if cache.entries.len() != total {
            warn!("Dropped {} cache entries with the wrong dimension", total - cache.entries.len());
            cache.dirty = true;
        }

        info!("Loaded {} cached embeddings from {}", cache.entries.len(), path.display());
        Ok(cache)
    }

    /// Read the header of a cache file without checking its model
    pub fn inspect(path: &Path) -> Result<Option<CacheSummary>> {
        if !path.exists() {
            return Ok(None);
        }
        let size_bytes = fs::metadata(path)?.len();
        let file: CacheFile = serde_json::from_slice(&fs::read(path)?)?;
        Ok(Some(CacheSummary {
            model: file.model,
            dimension: file.dimension,
            entries: file.entries.len(),
            size_bytes,
        }))
    }

    pub fn get(&mut self, text: &str) -> Option<&[f32]> {
        match self.entries.get(&Self::key_for(text)) {
            Some(embedding) => {
                self.hits += 1;
                Some(embedding.as_slice())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, text: &str, embedding: Vec<f32>) {
        self.entries.insert(Self::key_for(text), embedding);
        self.dirty = true;
    }

    /// Write the cache atomically if anything changed since it was loaded
    pub fn flush(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut entries: Vec<CacheEntry> = self
            .entries
            .iter()
            .map(|(key, embedding)| CacheEntry {
                key: key.clone(),
                embedding: embedding.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let file = CacheFile {
            model: self.model.clone(),
            dimension: self.dimension,
            entries,
        };

        let temp = NamedTempFile::new_in(&parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, &file)?;
            writer.flush()?;
        }
        temp.persist(path).map_err(|e| RecommenderError::Io(e.error))?;

        debug!("Flushed {} embeddings to {}", file.entries.len(), path.display());
        self.dirty = false;
        Ok(())
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.dirty = true;
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            model: self.model.clone(),
        }
    }
}
