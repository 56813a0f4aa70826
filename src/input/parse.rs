//! Field parsers for scraped listing values

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

const WEEKS_PER_MONTH: f64 = 4.33;

/// Date layouts seen in listing exports, month-first when ambiguous
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d %b' %y",
    "%d %b %y",
];

fn number_regex() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("Invalid number regex"))
}

/// Parse a monthly stipend out of strings like `₹ 10,000 /month` or `2500 /week`.
///
/// Unpaid and performance-based listings count as zero. Ranges keep their
/// lower bound. Returns `None` when no amount can be found.
pub fn parse_stipend(raw: &str) -> Option<f64> {
    let lowered = raw.to_lowercase();
    if lowered.contains("unpaid") || lowered.contains("performance based") {
        return Some(0.0);
    }

    let without_separators = lowered.replace(',', "");
    let amount: f64 = number_regex()
        .find(&without_separators)?
        .as_str()
        .parse()
        .ok()?;

    if lowered.contains("/week") || lowered.contains("per week") {
        Some(amount * WEEKS_PER_MONTH)
    } else {
        Some(amount)
    }
}

/// Parse a calendar date in any of the supported layouts
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Timestamps like 2025-10-12T00:00:00 keep their date part
    let candidate = trimmed.split('T').next().unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        })
}

/// Split a location field into city and optional pincode.
///
/// Accepts plain strings (`Bangalore`) and the bracketed list form produced
/// by the scraper (`['Bangalore', '560001']`).
pub fn parse_location_field(raw: &str) -> (String, Option<String>) {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
        return (trimmed.to_string(), None);
    };

    let mut parts = inner
        .split(',')
        .map(|part| part.trim().trim_matches(|c| c == '\'' || c == '"').trim().to_string())
        .filter(|part| !part.is_empty());

    let city = parts.next().unwrap_or_default();
    let pincode = parts.next();
    (city, pincode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stipend_formats() {
        assert_eq!(parse_stipend("10000"), Some(10000.0));
        assert_eq!(parse_stipend("₹ 10,000 /month"), Some(10000.0));
        assert_eq!(parse_stipend("5000-8000 /month"), Some(5000.0));
        assert_eq!(parse_stipend("Unpaid"), Some(0.0));
        assert_eq!(parse_stipend("Performance based"), Some(0.0));
        assert_eq!(parse_stipend("to be discussed"), None);

        let weekly = parse_stipend("2,500 /week").unwrap();
        assert!((weekly - 10825.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 12);
        assert_eq!(parse_date("2025-10-12"), expected);
        assert_eq!(parse_date("10/12/2025"), expected);
        assert_eq!(parse_date("12 Oct 2025"), expected);
        assert_eq!(parse_date("12 October 2025"), expected);
        assert_eq!(parse_date("Oct 12, 2025"), expected);
        assert_eq!(parse_date("12 Oct' 25"), expected);
        assert_eq!(parse_date("2025-10-12T08:30:00"), expected);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn test_parse_location_field() {
        assert_eq!(
            parse_location_field("['Bangalore', '560001']"),
            ("Bangalore".to_string(), Some("560001".to_string()))
        );
        assert_eq!(parse_location_field("Work From Home"), ("Work From Home".to_string(), None));
        assert_eq!(parse_location_field("[\"Pune\"]"), ("Pune".to_string(), None));
    }
}
