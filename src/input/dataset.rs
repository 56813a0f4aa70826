//! CSV dataset loading

use crate::error::{RecommenderError, Result};
use crate::input::parse::{parse_date, parse_location_field, parse_stipend};
use crate::processing::listing::Listing;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use serde::Deserialize;

/// Logical columns every dataset must provide
const REQUIRED_COLUMNS: &[&str] = &["id", "title", "requirements", "location", "stipend"];

/// Listings parsed from a dataset plus the rows that were skipped
#[derive(Debug)]
pub struct DatasetLoad {
    pub listings: Vec<Listing>,
    pub skipped: Vec<RecommenderError>,
}

#[derive(Debug, Deserialize)]
struct RawListing {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    requirements: Option<String>,
    location: Option<String>,
    stipend: Option<String>,
    deadline: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Map export-specific header names onto the logical column names
fn canonical_column(header: &str) -> String {
    let lowered = header.trim().to_lowercase();
    match lowered.as_str() {
        "role" | "job title" => "title".to_string(),
        "skills" | "required skills" => "requirements".to_string(),
        "apply by date" | "apply_by" => "deadline".to_string(),
        "latitude" => "lat".to_string(),
        "longitude" | "lng" => "lon".to_string(),
        _ => lowered,
    }
}

/// Canonicalize a header row, keeping the first column for each logical name.
///
/// Later columns that map onto an already seen name are renamed so row
/// decoding ignores them.
fn canonical_headers(raw: &StringRecord) -> StringRecord {
    let mut seen: Vec<String> = Vec::new();
    raw.iter()
        .enumerate()
        .map(|(index, header)| {
            let column = canonical_column(header);
            if seen.contains(&column) {
                warn!(
                    "Column '{}' duplicates '{}', using the first one",
                    header.trim(),
                    column
                );
                format!("{} (ignored #{})", column, index)
            } else {
                seen.push(column.clone());
                column
            }
        })
        .collect()
}

fn required(value: Option<String>, column: &str, line: u64) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RecommenderError::MalformedRow {
            line,
            reason: format!("missing {}", column),
        })
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl RawListing {
    fn into_listing(self, line: u64) -> Result<Listing> {
        let id = required(self.id, "id", line)?;
        let title = required(self.title, "title", line)?;
        let requirements = required(self.requirements, "requirements", line)?;
        let location = required(self.location, "location", line)?;
        let raw_stipend = required(self.stipend, "stipend", line)?;

        let stipend = parse_stipend(&raw_stipend).ok_or_else(|| RecommenderError::MalformedRow {
            line,
            reason: format!("unparseable stipend '{}'", raw_stipend),
        })?;

        let deadline = match self.deadline.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date(raw).ok_or_else(|| RecommenderError::MalformedRow {
                line,
                reason: format!("unparseable deadline '{}'", raw),
            })?),
        };

        let (city, _pincode) = parse_location_field(&location);

        Ok(Listing {
            id,
            title,
            description: self.description.unwrap_or_default().trim().to_string(),
            requirements,
            location,
            city: Some(city).filter(|c| !c.is_empty()),
            stipend,
            deadline,
            lat: finite(self.lat),
            lon: finite(self.lon),
        })
    }
}

/// Parse a CSV dataset, skipping malformed rows
pub fn parse_listings(data: &[u8]) -> Result<DatasetLoad> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let headers = canonical_headers(reader.headers()?);

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(RecommenderError::InvalidDataset(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut listings = Vec::new();
    let mut skipped = Vec::new();

    for result in reader.records() {
        let parsed = result
            .map_err(RecommenderError::from)
            .and_then(|record| {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                record
                    .deserialize::<RawListing>(Some(&headers))
                    .map_err(|e| RecommenderError::MalformedRow { line, reason: e.to_string() })
                    .and_then(|raw| raw.into_listing(line))
            });

        match parsed {
            Ok(listing) => listings.push(listing),
            Err(err) => {
                warn!("Skipping row: {}", err);
                skipped.push(err);
            }
        }
    }

    debug!("Parsed {} listings, skipped {} rows", listings.len(), skipped.len());
    Ok(DatasetLoad { listings, skipped })
}
