//! Embedding backends and cached semantic similarity

use crate::error::{RecommenderError, Result};
use crate::processing::cache::{CacheStats, EmbeddingCache};
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Instant;
use unicode_segmentation::UnicodeSegmentation;

/// Turns text into a fixed-length vector
pub trait Embedder {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Model2Vec static embeddings loaded from a local model directory
pub struct StaticEmbedder {
    model: StaticModel,
    name: String,
    dimension: usize,
}

impl StaticEmbedder {
    pub fn load(model_path: &Path, name: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(model_path, None, None, None)?;

        let dimension = model.encode_single("internship").len();
        if dimension == 0 {
            return Err(RecommenderError::ModelLoading(format!(
                "Model at {} produced empty embeddings",
                model_path.display()
            )));
        }

        info!("Model loaded in {:.2?} ({} dimensions)", start_time.elapsed(), dimension);
        Ok(Self {
            model,
            name: name.to_string(),
            dimension,
        })
    }
}

impl Embedder for StaticEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.model.encode_single(text);
        if embedding.is_empty() {
            return Err(RecommenderError::EmbeddingUnavailable(format!(
                "{} returned no embedding",
                self.name
            )));
        }
        Ok(embedding)
    }
}

/// Deterministic feature-hashing embedder.
///
/// Each lowercase word and adjacent word pair is hashed with SHA-256 into a
/// signed bucket, then the vector is L2 normalized. Needs no model files, so
/// results are identical on every machine.
pub struct HashingEmbedder {
    name: String,
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            name: format!("hashing-{}", dimension),
            dimension,
        }
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut index_bytes = [0u8; 8];
        index_bytes.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(index_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let words: Vec<String> = text.unicode_words().map(|w| w.to_lowercase()).collect();
        let mut vector = vec![0.0f32; self.dimension];

        for word in &words {
            let (index, sign) = self.bucket(word);
            vector[index] += sign;
        }
        for pair in words.windows(2) {
            let (index, sign) = self.bucket(&format!("{} {}", pair[0], pair[1]));
            vector[index] += 0.5 * sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

/// Stand-in used when the configured model could not be loaded; every call fails
pub struct UnavailableEmbedder {
    name: String,
    reason: String,
}

impl UnavailableEmbedder {
    pub fn new(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl Embedder for UnavailableEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        0
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RecommenderError::EmbeddingUnavailable(self.reason.clone()))
    }
}

/// Embeds text through the cache, calling the backend at most once per unique text
pub struct EmbeddingEngine {
    embedder: Box<dyn Embedder>,
    cache: EmbeddingCache,
    embedder_calls: usize,
}

impl EmbeddingEngine {
    pub fn new(embedder: Box<dyn Embedder>, cache: EmbeddingCache) -> Self {
        Self {
            embedder,
            cache,
            embedder_calls: 0,
        }
    }

    /// Engine with a throwaway in-memory cache
    pub fn uncached(embedder: Box<dyn Embedder>) -> Self {
        let cache = EmbeddingCache::in_memory(embedder.name(), embedder.dimension());
        Self::new(embedder, cache)
    }

    pub fn model_name(&self) -> &str {
        self.embedder.name()
    }

    /// Encode a single text, reusing a cached vector when one exists
    pub fn embed_cached(&mut self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.get(text) {
            return Ok(cached.to_vec());
        }

        self.embedder_calls += 1;
        let embedding = self.embedder.embed(text)?;

        if embedding.len() != self.embedder.dimension() {
            return Err(RecommenderError::EmbeddingUnavailable(format!(
                "{} returned {} dimensions, expected {}",
                self.embedder.name(),
                embedding.len(),
                self.embedder.dimension()
            )));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(RecommenderError::EmbeddingUnavailable(format!(
                "{} returned a non-finite embedding",
                self.embedder.name()
            )));
        }

        self.cache.put(text, embedding.clone());
        Ok(embedding)
    }

    /// Cosine similarity between two embeddings
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(RecommenderError::EmbeddingUnavailable(format!(
                "Embedding dimensions don't match: {} vs {}",
                a.len(),
                b.len()
            )));
        }

        if a.is_empty() {
            return Ok(0.0);
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            Ok(0.0)
        } else {
            Ok(dot_product / (norm_a * norm_b))
        }
    }

    /// Similarity of `text` to an already embedded reference, clamped to [0, 1]
    pub fn similarity_to(&mut self, reference: &[f32], text: &str) -> Result<f64> {
        let embedding = self.embed_cached(text)?;
        let score = Self::cosine_similarity(reference, &embedding)? as f64;
        Ok(score.clamp(0.0, 1.0))
    }

    /// Semantic similarity of two texts, clamped to [0, 1]
    pub fn semantic_similarity(&mut self, a: &str, b: &str) -> Result<f64> {
        let reference = self.embed_cached(a)?;
        self.similarity_to(&reference, b)
    }

    pub fn embedder_calls(&self) -> usize {
        self.embedder_calls
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Persist new cache entries
    pub fn flush(&mut self) -> Result<()> {
        debug!(
            "Embedding cache: {} entries, {} backend calls",
            self.cache.len(),
            self.embedder_calls
        );
        self.cache.flush()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CountingEmbedder;
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0f32, 0.0, 0.0];
        let b = [0.0f32, 1.0, 0.0];
        assert_eq!(EmbeddingEngine::cosine_similarity(&a, &a).unwrap(), 1.0);
        assert_eq!(EmbeddingEngine::cosine_similarity(&a, &b).unwrap(), 0.0);
        assert_eq!(EmbeddingEngine::cosine_similarity(&a, &[0.0, 0.0, 0.0]).unwrap(), 0.0);
        assert!(EmbeddingEngine::cosine_similarity(&a, &[1.0]).is_err());
    }

    #[test]
    fn test_same_text_embeds_once() {
        let (embedder, calls) = CountingEmbedder::new();
        let mut engine = EmbeddingEngine::uncached(Box::new(embedder));

        let first = engine.embed_cached("Data analyst intern").unwrap();
        let second = engine.embed_cached("Data analyst intern").unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.embedder_calls(), 1);
        assert_eq!(engine.cache_stats().hits, 1);
    }

    #[test]
    fn test_similarity_is_clamped() {
        let (embedder, _) = CountingEmbedder::new();
        let mut engine = EmbeddingEngine::uncached(Box::new(embedder));

        let same = engine.semantic_similarity("python sql", "python sql").unwrap();
        assert!((same - 1.0).abs() < 1e-6);

        let opposite: Vec<f32> = engine.embed_cached("python").unwrap().iter().map(|v| -v).collect();
        assert_eq!(engine.similarity_to(&opposite, "python").unwrap(), 0.0);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let (embedder, calls) = CountingEmbedder::failing_on("broken");
        let mut engine = EmbeddingEngine::uncached(Box::new(embedder));

        assert!(matches!(
            engine.embed_cached("broken listing"),
            Err(RecommenderError::EmbeddingUnavailable(_))
        ));
        assert!(engine.embed_cached("broken listing").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(engine.cache_stats().entries, 0);
    }

    #[test]
    fn test_hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("Machine learning with Python").unwrap();
        let b = embedder.embed("machine LEARNING with python").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);

        let empty = embedder.embed("").unwrap();
        assert!(empty.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_hashing_embedder_prefers_related_text() {
        let mut engine = EmbeddingEngine::uncached(Box::new(HashingEmbedder::new(256)));
        let profile = "python, sql. data analysis with python and sql";
        let related = engine.semantic_similarity(profile, "Data analyst. python sql reporting").unwrap();
        let unrelated = engine.semantic_similarity(profile, "Graphic designer. photoshop illustrator").unwrap();
        assert!(related > unrelated, "{} <= {}", related, unrelated);
    }

    #[test]
    fn test_unavailable_embedder_always_fails() {
        let mut engine = EmbeddingEngine::uncached(Box::new(UnavailableEmbedder::new("potion-base-8M", "model missing")));
        assert!(engine.embed_cached("anything").is_err());
        assert_eq!(engine.model_name(), "potion-base-8M");
    }
}
