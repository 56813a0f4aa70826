//! Weighted aggregation of the per-listing signals

use crate::config::{Config, ScoringWeights};
use crate::error::Result;
use crate::processing::explain::Explainer;
use crate::processing::geolocation::LocationScorer;
use crate::processing::listing::{Listing, UserProfile};
use crate::processing::rules;
use crate::processing::skills::SkillMatch;
use serde::Serialize;

/// Each signal in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScores {
    pub semantic: f64,
    pub skill_overlap: f64,
    pub location: f64,
    pub stipend: f64,
    pub deadline: f64,
}

impl ComponentScores {
    pub fn weighted_sum(&self, weights: &ScoringWeights) -> f64 {
        weights.semantic * self.semantic
            + weights.skill * self.skill_overlap
            + weights.location * self.location
            + weights.stipend * self.stipend
            + weights.deadline * self.deadline
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub final_score: f64,
    pub component_scores: ComponentScores,
    pub explanation_tags: Vec<String>,
    pub matched_skills: Vec<SkillMatch>,
    pub distance_km: Option<f64>,
}

/// Skill evidence for one listing, produced by the hard filter
#[derive(Debug, Clone)]
pub struct SkillEvidence {
    pub matches: Vec<SkillMatch>,
    pub overlap: f64,
    pub total_skills: usize,
}

/// Combines the five signals with normalized weights.
///
/// Holds no mutable state; the same inputs always give the same result.
pub struct Scorer {
    weights: ScoringWeights,
    location: LocationScorer,
    explainer: Explainer,
}

impl Scorer {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            weights: config.scoring.weights.normalized()?,
            location: LocationScorer::new(&config.scoring),
            explainer: Explainer::new(&config.explain),
        })
    }

    /// Weights after normalization, summing to 1
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(
        &self,
        profile: &UserProfile,
        listing: &Listing,
        skills: SkillEvidence,
        semantic: f64,
    ) -> ScoredListing {
        let location = self.location.score(profile, listing);

        let components = ComponentScores {
            semantic: semantic.clamp(0.0, 1.0),
            skill_overlap: skills.overlap.clamp(0.0, 1.0),
            location: location.score,
            stipend: rules::stipend_score(listing.stipend, profile.min_stipend),
            deadline: rules::deadline_score(listing.deadline, profile.available_from),
        };

        let final_score = components.weighted_sum(&self.weights).clamp(0.0, 1.0);
        let explanation_tags = self.explainer.explain(
            profile,
            listing,
            &components,
            &skills,
            &location,
        );

        ScoredListing {
            listing: listing.clone(),
            final_score,
            component_scores: components,
            explanation_tags,
            matched_skills: skills.matches,
            distance_km: location.distance_km,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::listing::fixtures::{listing, profile};
    use crate::processing::skills::MatchMode;
    use chrono::NaiveDate;

    fn evidence(matched: &[&str], total: usize) -> SkillEvidence {
        SkillEvidence {
            matches: matched
                .iter()
                .map(|s| SkillMatch {
                    skill: s.to_string(),
                    mode: MatchMode::Exact,
                    score: 1.0,
                })
                .collect(),
            overlap: matched.len() as f64 / total as f64,
            total_skills: total,
        }
    }

    #[test]
    fn test_final_score_is_weighted_sum() {
        let scorer = Scorer::new(&Config::default()).unwrap();
        let mut listing = listing("1", "Python");
        listing.stipend = 5000.0;

        let scored = scorer.score(&profile(&["python", "sql"]), &listing, evidence(&["python"], 2), 0.6);
        let c = scored.component_scores;
        assert_eq!(c.skill_overlap, 0.5);
        assert_eq!(c.location, 1.0);
        assert_eq!(c.stipend, 0.5);
        assert_eq!(c.deadline, 1.0);

        let expected = 0.50 * 0.6 + 0.20 * 0.5 + 0.15 * 1.0 + 0.08 * 0.5 + 0.07 * 1.0;
        assert!((scored.final_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unnormalized_weights_are_scaled() {
        let mut config = Config::default();
        config.scoring.weights = ScoringWeights {
            semantic: 2.0,
            skill: 2.0,
            location: 0.0,
            stipend: 0.0,
            deadline: 0.0,
        };
        let scorer = Scorer::new(&config).unwrap();
        assert!((scorer.weights().sum() - 1.0).abs() < 1e-12);

        let scored = scorer.score(&profile(&["python"]), &listing("1", "Python"), evidence(&["python"], 1), 1.0);
        assert!((scored.final_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_weights_are_rejected() {
        let mut config = Config::default();
        config.scoring.weights.semantic = -1.0;
        assert!(Scorer::new(&config).is_err());
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let scorer = Scorer::new(&Config::default()).unwrap();
        let mut profile = profile(&["python"]);
        profile.available_from = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        profile.min_stipend = None;

        let scored = scorer.score(&profile, &listing("1", "Python"), evidence(&["python"], 1), 1.7);
        assert_eq!(scored.component_scores.semantic, 1.0);
        assert_eq!(scored.component_scores.deadline, 0.0);
        assert_eq!(scored.component_scores.stipend, 0.5);
        assert!((0.0..=1.0).contains(&scored.final_score));
    }

    #[test]
    fn test_serializes_listing_fields_flat() {
        let scorer = Scorer::new(&Config::default()).unwrap();
        let scored = scorer.score(&profile(&["python"]), &listing("7", "Python"), evidence(&["python"], 1), 0.8);

        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["title"], "Intern 7");
        assert!(json["component_scores"]["semantic"].is_number());
        assert_eq!(json["matched_skills"][0]["mode"], "exact");
    }
}
