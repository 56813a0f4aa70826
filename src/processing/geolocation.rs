//! Location matching between a profile and a listing

use crate::config::ScoringConfig;
use crate::processing::listing::{Listing, UserProfile};

const EARTH_RADIUS_KM: f64 = 6371.0088;

const REMOTE_MARKERS: &[&str] = &["remote", "work from home", "wfh", "anywhere"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationMatch {
    pub score: f64,
    pub distance_km: Option<f64>,
    pub kind: LocationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    SameCity,
    Nearby,
    Remote,
    NoMatch,
}

fn normalize_place(place: &str) -> String {
    place
        .trim()
        .trim_matches(|c| c == '\'' || c == '"' || c == '[' || c == ']')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn is_remote(location: &str) -> bool {
    let lowered = location.to_lowercase();
    REMOTE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Great-circle distance between two (lat, lon) points in kilometres
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// True when the preferred place equals the listing city or one of its listed places
fn same_place(preferred: &str, listing: &Listing) -> bool {
    let preferred = normalize_place(preferred);
    if preferred.is_empty() {
        return false;
    }

    listing
        .city
        .iter()
        .map(|c| normalize_place(c))
        .chain(listing.location.split(',').map(normalize_place))
        .any(|place| place == preferred)
}

pub struct LocationScorer {
    remote_credit: f64,
    radius_km: f64,
}

impl LocationScorer {
    pub fn new(scoring: &ScoringConfig) -> Self {
        Self {
            remote_credit: scoring.remote_credit,
            radius_km: scoring.location_radius_km,
        }
    }

    pub fn score(&self, profile: &UserProfile, listing: &Listing) -> LocationMatch {
        let measured = profile
            .coordinates()
            .zip(listing.coordinates())
            .map(|(from, to)| haversine_km(from, to));

        let (mut score, mut kind, distance_km) = match measured {
            Some(d) => {
                let decayed = (1.0 - d / self.radius_km).max(0.0);
                let kind = if decayed > 0.0 { LocationKind::Nearby } else { LocationKind::NoMatch };
                (decayed, kind, Some(d))
            }
            // same city counts as zero distance
            None if same_place(&profile.location, listing) => (1.0, LocationKind::SameCity, Some(0.0)),
            None => (0.0, LocationKind::NoMatch, None),
        };

        if profile.remote_ok && is_remote(&listing.location) && self.remote_credit > score {
            score = self.remote_credit;
            kind = LocationKind::Remote;
        }

        LocationMatch {
            score: score.clamp(0.0, 1.0),
            distance_km,
            kind,
        }
    }
}
