//! Human readable reasons attached to each recommendation

use crate::config::ExplainConfig;
use crate::processing::geolocation::{LocationKind, LocationMatch};
use crate::processing::listing::{Listing, UserProfile};
use crate::processing::scoring::{ComponentScores, SkillEvidence};

pub struct Explainer {
    semantic_high: f64,
    semantic_good: f64,
}

impl Explainer {
    pub fn new(config: &ExplainConfig) -> Self {
        Self {
            semantic_high: config.semantic_high,
            semantic_good: config.semantic_good,
        }
    }

    /// Tags in a fixed order: semantic, skills, location, stipend, deadline
    pub fn explain(
        &self,
        profile: &UserProfile,
        listing: &Listing,
        scores: &ComponentScores,
        skills: &SkillEvidence,
        location: &LocationMatch,
    ) -> Vec<String> {
        let mut tags = Vec::new();

        if scores.semantic > self.semantic_high {
            tags.push(format!("Semantic match: high (score: {:.2})", scores.semantic));
        } else if scores.semantic > self.semantic_good {
            tags.push(format!("Semantic match: good (score: {:.2})", scores.semantic));
        }

        if !skills.matches.is_empty() {
            let listed: Vec<String> = skills.matches.iter().map(|m| m.to_string()).collect();
            tags.push(format!(
                "Matches {}/{} of your skills: {}",
                skills.matches.len(),
                skills.total_skills,
                listed.join(", ")
            ));
        }

        if let Some(tag) = location_tag(listing, location) {
            tags.push(tag);
        }

        if let Some(min) = profile.min_stipend.filter(|m| *m > 0.0) {
            if scores.stipend >= 1.0 {
                tags.push(format!(
                    "Stipend {:.0} meets your {:.0} minimum",
                    listing.stipend, min
                ));
            }
        }

        if let Some(deadline) = listing.deadline {
            if scores.deadline >= 1.0 {
                tags.push(format!(
                    "Apply by {} - open when you are available",
                    deadline.format("%Y-%m-%d")
                ));
            }
        }

        tags
    }
}

fn location_tag(listing: &Listing, location: &LocationMatch) -> Option<String> {
    if location.score <= 0.0 {
        return None;
    }
    let place = listing.city.as_deref().unwrap_or(&listing.location);

    match location.kind {
        LocationKind::Remote => Some("Remote: works with your remote preference".to_string()),
        LocationKind::Nearby => location
            .distance_km
            .map(|d| format!("Location: {} - {:.1} km away", place, d)),
        LocationKind::SameCity => Some(format!("Location: {} matches your preference", place)),
        LocationKind::NoMatch => None,
    }
}
