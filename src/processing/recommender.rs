//! End-to-end recommendation pipeline

use crate::config::{Config, DeadlinePolicy, EmbeddingFailurePolicy};
use crate::error::{RecommenderError, Result};
use crate::processing::embeddings::EmbeddingEngine;
use crate::processing::geolocation::haversine_km;
use crate::processing::listing::{Listing, UserProfile};
use crate::processing::ranker;
use crate::processing::rules;
use crate::processing::scoring::{ScoredListing, Scorer, SkillEvidence};
use crate::processing::skills::SkillMatcher;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub total_listings: usize,
    pub passed_filter: usize,
    pub dropped_by_distance: usize,
    pub dropped_expired: usize,
    pub scored: usize,
    pub embedding_failures: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RecommendationRun {
    pub recommendations: Vec<ScoredListing>,
    pub stats: RunStats,
}

pub struct Recommender {
    config: Config,
    scorer: Scorer,
    engine: EmbeddingEngine,
    max_distance_km: Option<f64>,
    show_progress: bool,
}

impl Recommender {
    pub fn new(config: &Config, engine: EmbeddingEngine) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            scorer: Scorer::new(config)?,
            engine,
            max_distance_km: None,
            show_progress: false,
        })
    }

    /// Drop listings whose known distance from the user exceeds `limit`
    pub fn with_max_distance(mut self, limit: Option<f64>) -> Self {
        self.max_distance_km = limit;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn engine(&self) -> &EmbeddingEngine {
        &self.engine
    }

    /// Filter, score, and rank `listings` for `profile`, returning the top `k`.
    ///
    /// New embeddings are flushed to the cache only when the run succeeds.
    pub fn recommend(&mut self, profile: &UserProfile, listings: &[Listing], k: usize) -> Result<RecommendationRun> {
        let start_time = Instant::now();
        let cache_before = self.engine.cache_stats();
        let mut stats = RunStats {
            total_listings: listings.len(),
            ..RunStats::default()
        };

        let matcher = SkillMatcher::new(&profile.skills, &self.config.scoring)?;
        if matcher.skill_count() == 0 {
            warn!("User profile has no skills, empty skill policy is {:?}", self.config.scoring.empty_skills);
        }

        let mut candidates: Vec<(&Listing, SkillEvidence)> = Vec::new();
        for listing in listings {
            let matches = matcher.match_skills(&listing.requirements);
            if !matcher.passes(&matches) {
                continue;
            }
            stats.passed_filter += 1;

            if self.beyond_max_distance(profile, listing) {
                stats.dropped_by_distance += 1;
                continue;
            }

            if self.config.scoring.expired_deadline == DeadlinePolicy::Drop
                && rules::is_expired(listing.deadline, profile.available_from)
            {
                stats.dropped_expired += 1;
                continue;
            }

            let overlap = matcher.overlap(&matches);
            candidates.push((
                listing,
                SkillEvidence {
                    matches,
                    overlap,
                    total_skills: matcher.skill_count(),
                },
            ));
        }

        info!(
            "{} of {} listings passed the skill filter, scoring {}",
            stats.passed_filter,
            stats.total_listings,
            candidates.len()
        );

        if candidates.is_empty() {
            stats.processing_time_ms = start_time.elapsed().as_millis() as u64;
            return Ok(RecommendationRun {
                recommendations: Vec::new(),
                stats,
            });
        }

        let profile_embedding = match self.engine.embed_cached(&profile.embedding_text()) {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                self.on_embedding_failure("user profile", e)?;
                None
            }
        };

        let progress = self.progress_bar(candidates.len());
        let mut scored = Vec::with_capacity(candidates.len());

        for (listing, skills) in candidates {
            let semantic = match &profile_embedding {
                Some(reference) => match self.engine.similarity_to(reference, &listing.embedding_text()) {
                    Ok(score) => score,
                    Err(e) => {
                        self.on_embedding_failure(&format!("listing {}", listing.id), e)?;
                        stats.embedding_failures += 1;
                        0.0
                    }
                },
                None => {
                    stats.embedding_failures += 1;
                    0.0
                }
            };

            scored.push(self.scorer.score(profile, listing, skills, semantic));
            progress.inc(1);
        }
        progress.finish_and_clear();

        stats.scored = scored.len();
        let recommendations = ranker::rank(scored, k);

        self.engine.flush()?;

        let cache = self.engine.cache_stats();
        stats.cache_hits = cache.hits - cache_before.hits;
        stats.cache_misses = cache.misses - cache_before.misses;
        stats.processing_time_ms = start_time.elapsed().as_millis() as u64;

        debug!("Run stats: {:?}", stats);
        Ok(RecommendationRun { recommendations, stats })
    }

    fn beyond_max_distance(&self, profile: &UserProfile, listing: &Listing) -> bool {
        let Some(limit) = self.max_distance_km else {
            return false;
        };
        profile
            .coordinates()
            .zip(listing.coordinates())
            .is_some_and(|(from, to)| haversine_km(from, to) > limit)
    }

    fn on_embedding_failure(&self, what: &str, error: RecommenderError) -> Result<()> {
        match self.config.scoring.embedding_failure {
            EmbeddingFailurePolicy::Abort => Err(RecommenderError::EmbeddingUnavailable(format!(
                "Failed to embed {}: {}",
                what, error
            ))),
            EmbeddingFailurePolicy::ZeroScore => {
                warn!("Failed to embed {}, semantic score set to 0: {}", what, error);
                Ok(())
            }
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} listings ({percent}%)",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::embeddings::testing::CountingEmbedder;
    use crate::processing::embeddings::HashingEmbedder;
    use crate::processing::listing::fixtures::{listing, profile};
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;

    fn recommender(config: &Config) -> Recommender {
        let engine = EmbeddingEngine::uncached(Box::new(HashingEmbedder::new(128)));
        Recommender::new(config, engine).unwrap()
    }

    fn listings() -> Vec<Listing> {
        let mut data = listing("1", "Python, SQL");
        data.title = "Data Analyst Intern".to_string();

        let mut design = listing("2", "Photoshop, Illustrator");
        design.title = "Graphic Design Intern".to_string();

        let mut ml = listing("3", "Python, Machine Learning");
        ml.title = "ML Intern".to_string();
        ml.stipend = 5000.0;

        vec![data, design, ml]
    }

    #[test]
    fn test_filters_and_ranks() {
        let mut recommender = recommender(&Config::default());
        let run = recommender
            .recommend(&profile(&["python", "sql"]), &listings(), 5)
            .unwrap();

        let ids: Vec<&str> = run.recommendations.iter().map(|r| r.listing.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&"2"));
        assert_eq!(ids[0], "1");
        assert_eq!(run.stats.total_listings, 3);
        assert_eq!(run.stats.passed_filter, 2);
        assert_eq!(run.stats.scored, 2);
        assert!(run
            .recommendations
            .windows(2)
            .all(|w| w[0].final_score >= w[1].final_score));
    }

    #[test]
    fn test_top_k_size() {
        let mut recommender = recommender(&Config::default());
        let profile = profile(&["python", "sql"]);

        assert!(recommender.recommend(&profile, &listings(), 0).unwrap().recommendations.is_empty());
        assert_eq!(recommender.recommend(&profile, &listings(), 1).unwrap().recommendations.len(), 1);
        assert_eq!(recommender.recommend(&profile, &listings(), 50).unwrap().recommendations.len(), 2);
    }

    #[test]
    fn test_nothing_passes_filter() {
        let (embedder, calls) = CountingEmbedder::new();
        let engine = EmbeddingEngine::uncached(Box::new(embedder));
        let mut recommender = Recommender::new(&Config::default(), engine).unwrap();

        let run = recommender.recommend(&profile(&["rust"]), &listings(), 5).unwrap();
        assert!(run.recommendations.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_repeated_text_embeds_once() {
        let (embedder, calls) = CountingEmbedder::new();
        let engine = EmbeddingEngine::uncached(Box::new(embedder));
        let mut recommender = Recommender::new(&Config::default(), engine).unwrap();

        let twins = vec![listing("1", "Python"), {
            let mut twin = listing("1", "Python");
            twin.id = "2".to_string();
            twin.title = "Intern 1".to_string();
            twin
        }];

        let run = recommender.recommend(&profile(&["python"]), &twins, 5).unwrap();
        assert_eq!(run.recommendations.len(), 2);
        assert_eq!(
            run.recommendations[0].component_scores.semantic,
            run.recommendations[1].component_scores.semantic
        );
        // profile text + one shared listing text
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(run.stats.cache_hits, 1);
    }

    #[test]
    fn test_cache_counts_are_per_run() {
        let (embedder, calls) = CountingEmbedder::new();
        let engine = EmbeddingEngine::uncached(Box::new(embedder));
        let mut recommender = Recommender::new(&Config::default(), engine).unwrap();
        let profile = profile(&["python", "sql"]);

        let first = recommender.recommend(&profile, &listings(), 5).unwrap();
        assert_eq!(first.stats.cache_misses, 3);
        assert_eq!(first.stats.cache_hits, 0);

        let second = recommender.recommend(&profile, &listings(), 5).unwrap();
        assert_eq!(second.stats.cache_misses, 0);
        assert_eq!(second.stats.cache_hits, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_embedding_failure_zero_score() {
        let (embedder, _) = CountingEmbedder::failing_on("Data Analyst");
        let engine = EmbeddingEngine::uncached(Box::new(embedder));
        let mut recommender = Recommender::new(&Config::default(), engine).unwrap();

        let run = recommender
            .recommend(&profile(&["python", "sql"]), &listings(), 5)
            .unwrap();
        let failed = run.recommendations.iter().find(|r| r.listing.id == "1").unwrap();
        assert_eq!(failed.component_scores.semantic, 0.0);
        assert_eq!(run.stats.embedding_failures, 1);
        assert_eq!(run.recommendations.len(), 2);
    }

    #[test]
    fn test_embedding_failure_abort() {
        let mut config = Config::default();
        config.scoring.embedding_failure = EmbeddingFailurePolicy::Abort;
        let (embedder, _) = CountingEmbedder::failing_on("Data Analyst");
        let engine = EmbeddingEngine::uncached(Box::new(embedder));
        let mut recommender = Recommender::new(&config, engine).unwrap();

        let result = recommender.recommend(&profile(&["python", "sql"]), &listings(), 5);
        assert!(matches!(result, Err(RecommenderError::EmbeddingUnavailable(_))));
    }

    #[test]
    fn test_expired_deadline_policies() {
        let mut expired = listing("9", "Python");
        expired.deadline = NaiveDate::from_ymd_opt(2025, 9, 1);
        let data = vec![listing("1", "Python"), expired];
        let profile = profile(&["python"]);

        let run = recommender(&Config::default()).recommend(&profile, &data, 5).unwrap();
        let kept = run.recommendations.iter().find(|r| r.listing.id == "9").unwrap();
        assert_eq!(kept.component_scores.deadline, 0.0);

        let mut config = Config::default();
        config.scoring.expired_deadline = DeadlinePolicy::Drop;
        let run = recommender(&config).recommend(&profile, &data, 5).unwrap();
        assert_eq!(run.recommendations.len(), 1);
        assert_eq!(run.stats.dropped_expired, 1);
    }

    #[test]
    fn test_max_distance_drops_far_listings() {
        let mut profile = profile(&["python"]);
        profile.lat = Some(12.9716);
        profile.lon = Some(77.5946);

        let mut far = listing("2", "Python");
        far.lat = Some(19.0760);
        far.lon = Some(72.8777);
        let unknown = listing("3", "Python");

        let mut recommender = recommender(&Config::default()).with_max_distance(Some(100.0));
        let run = recommender.recommend(&profile, &[far, unknown], 5).unwrap();
        assert_eq!(run.recommendations.len(), 1);
        assert_eq!(run.recommendations[0].listing.id, "3");
        assert_eq!(run.stats.dropped_by_distance, 1);
    }

    #[test]
    fn test_empty_skills_pass_all_policy() {
        let mut config = Config::default();
        config.scoring.empty_skills = crate::config::EmptySkillPolicy::PassAll;

        let run = recommender(&config).recommend(&profile(&[]), &listings(), 5).unwrap();
        assert_eq!(run.recommendations.len(), 3);
        assert!(run.recommendations.iter().all(|r| r.component_scores.skill_overlap == 0.0));

        let run = recommender(&Config::default()).recommend(&profile(&[]), &listings(), 5).unwrap();
        assert!(run.recommendations.is_empty());
    }
}
