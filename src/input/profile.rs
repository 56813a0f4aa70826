//! User profile loading and validation

use crate::error::{RecommenderError, Result};
use crate::input::parse::parse_date;
use crate::processing::listing::UserProfile;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillsField {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    skills: Option<SkillsField>,
    location: Option<String>,
    preferred_location: Option<String>,
    remote_ok: Option<bool>,
    min_stipend: Option<f64>,
    available_from: Option<String>,
    description: Option<String>,
    qualification: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

fn invalid(reason: impl Into<String>) -> RecommenderError {
    RecommenderError::InvalidUserProfile(reason.into())
}

/// Trim, drop empties and de-duplicate case-insensitively, keeping first spelling
fn clean_skills(field: SkillsField) -> Vec<String> {
    let raw: Vec<String> = match field {
        SkillsField::List(list) => list,
        SkillsField::Text(text) => text.split(',').map(str::to_string).collect(),
    };

    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

/// Parse and validate a JSON user profile.
///
/// `today` is used when the profile does not say when the user is available.
pub fn parse_profile(data: &str, today: NaiveDate) -> Result<UserProfile> {
    let raw: RawProfile = serde_json::from_str(data)
        .map_err(|e| invalid(format!("could not decode JSON: {}", e)))?;

    let skills = clean_skills(raw.skills.ok_or_else(|| invalid("missing required field 'skills'"))?);

    // `location` wins over the `preferred_location` export name
    let location = raw
        .location
        .or(raw.preferred_location)
        .ok_or_else(|| invalid("missing required field 'location'"))?
        .trim()
        .to_string();

    let min_stipend = match raw.min_stipend {
        Some(value) if !value.is_finite() || value < 0.0 => {
            return Err(invalid(format!("min_stipend must be a non-negative number, got {}", value)));
        }
        other => other,
    };

    let available_from = match raw.available_from.as_deref().map(str::trim) {
        None | Some("") => today,
        Some(text) => parse_date(text)
            .ok_or_else(|| invalid(format!("unparseable available_from '{}'", text)))?,
    };

    let (lat, lon) = match (raw.lat, raw.lon) {
        (Some(lat), Some(lon)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) => {
            (Some(lat), Some(lon))
        }
        (None, None) => (None, None),
        (lat, lon) => {
            return Err(invalid(format!("lat/lon must both be valid coordinates, got {:?}/{:?}", lat, lon)));
        }
    };

    Ok(UserProfile {
        skills,
        location,
        remote_ok: raw.remote_ok.unwrap_or(false),
        min_stipend,
        available_from,
        description: raw
            .description
            .or(raw.qualification)
            .unwrap_or_default()
            .trim()
            .to_string(),
        lat,
        lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    #[test]
    fn test_parse_full_profile() {
        let json = r#"{
            "skills": ["Python", "SQL", "python", " "],
            "location": "Bangalore",
            "remote_ok": true,
            "min_stipend": 10000,
            "available_from": "2025-11-15",
            "description": "Data science student"
        }"#;

        let profile = parse_profile(json, today()).unwrap();
        assert_eq!(profile.skills, vec!["Python", "SQL"]);
        assert!(profile.remote_ok);
        assert_eq!(profile.min_stipend, Some(10000.0));
        assert_eq!(profile.available_from, NaiveDate::from_ymd_opt(2025, 11, 15).unwrap());
    }

    #[test]
    fn test_defaults_and_aliases() {
        let json = r#"{
            "skills": "react, node.js",
            "preferred_location": "Pune",
            "qualification": "B.Tech"
        }"#;

        let profile = parse_profile(json, today()).unwrap();
        assert_eq!(profile.skills, vec!["react", "node.js"]);
        assert_eq!(profile.location, "Pune");
        assert_eq!(profile.description, "B.Tech");
        assert!(!profile.remote_ok);
        assert_eq!(profile.min_stipend, None);
        assert_eq!(profile.available_from, today());
    }

    #[test]
    fn test_canonical_keys_win_over_aliases() {
        let json = r#"{
            "skills": ["rust"],
            "location": "Bangalore",
            "preferred_location": "Pune",
            "description": "Systems programmer",
            "qualification": "B.Tech"
        }"#;

        let profile = parse_profile(json, today()).unwrap();
        assert_eq!(profile.location, "Bangalore");
        assert_eq!(profile.description, "Systems programmer");
    }

    #[test]
    fn test_missing_required_fields() {
        let err = parse_profile(r#"{"location": "Pune"}"#, today()).unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidUserProfile(ref m) if m.contains("skills")));

        let err = parse_profile(r#"{"skills": ["rust"]}"#, today()).unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidUserProfile(ref m) if m.contains("location")));
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse_profile("{ not json", today()).is_err());
        assert!(parse_profile(
            r#"{"skills": [], "location": "Pune", "min_stipend": -5}"#,
            today()
        )
        .is_err());
        assert!(parse_profile(
            r#"{"skills": [], "location": "Pune", "available_from": "whenever"}"#,
            today()
        )
        .is_err());
        assert!(parse_profile(r#"{"skills": [], "location": "Pune", "lat": 12.9}"#, today()).is_err());
    }

    #[test]
    fn test_empty_skill_list_is_accepted() {
        let profile = parse_profile(r#"{"skills": [], "location": "Pune"}"#, today()).unwrap();
        assert!(profile.skills.is_empty());
    }
}
