//! Listing and user profile records shared across the pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One internship row from the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    /// First element of the location field, used for city matching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub stipend: f64,
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// The person recommendations are computed for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub skills: Vec<String>,
    pub location: String,
    pub remote_ok: bool,
    pub min_stipend: Option<f64>,
    pub available_from: NaiveDate,
    pub description: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Listing {
    /// Text embedded for semantic comparison
    pub fn embedding_text(&self) -> String {
        join_non_empty(&[&self.title, &self.description, &self.requirements], ". ")
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

impl UserProfile {
    /// Text embedded for semantic comparison
    pub fn embedding_text(&self) -> String {
        let skills = self.skills.join(", ");
        join_non_empty(&[&skills, &self.description], ". ")
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

fn join_non_empty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn listing(id: &str, requirements: &str) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Intern {}", id),
            description: String::new(),
            requirements: requirements.to_string(),
            location: "Bangalore".to_string(),
            city: Some("Bangalore".to_string()),
            stipend: 10000.0,
            deadline: NaiveDate::from_ymd_opt(2025, 12, 31),
            lat: None,
            lon: None,
        }
    }

    pub fn profile(skills: &[&str]) -> UserProfile {
        UserProfile {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            location: "Bangalore".to_string(),
            remote_ok: false,
            min_stipend: Some(10000.0),
            available_from: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            description: "Final year computer science student".to_string(),
            lat: None,
            lon: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_listing_embedding_text_skips_empty_parts() {
        let listing = listing("1", "Python, SQL");
        assert_eq!(listing.embedding_text(), "Intern 1. Python, SQL");
    }

    #[test]
    fn test_profile_embedding_text() {
        let profile = profile(&["python", "sql"]);
        assert_eq!(
            profile.embedding_text(),
            "python, sql. Final year computer science student"
        );
    }
}
