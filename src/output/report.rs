//! Report structures produced from a recommendation run

use crate::processing::recommender::{RecommendationRun, RunStats};
use crate::processing::scoring::ScoredListing;
use serde::Serialize;

/// One ranked recommendation, as written to JSON output
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// 1-based position in the ranking
    pub rank: usize,
    #[serde(flatten)]
    pub scored: ScoredListing,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: chrono::DateTime<chrono::Local>,
    pub embedding_model: String,
    pub total_listings: usize,
    pub passed_filter: usize,
    pub scored: usize,
    pub embedding_failures: usize,
    pub processing_time_ms: u64,
}

/// Everything the formatters need to render a run
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
    pub metadata: ReportMetadata,
}

impl RecommendationReport {
    pub fn from_run(run: RecommendationRun, embedding_model: &str) -> Self {
        let RunStats {
            total_listings,
            passed_filter,
            scored,
            embedding_failures,
            processing_time_ms,
            ..
        } = run.stats;

        let recommendations = run
            .recommendations
            .into_iter()
            .enumerate()
            .map(|(index, scored)| Recommendation { rank: index + 1, scored })
            .collect();

        Self {
            recommendations,
            metadata: ReportMetadata {
                generated_at: chrono::Local::now(),
                embedding_model: embedding_model.to_string(),
                total_listings,
                passed_filter,
                scored,
                embedding_failures,
                processing_time_ms,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}
