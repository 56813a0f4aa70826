//! Stipend and deadline rules

use chrono::NaiveDate;

/// Score used when the input needed for a rule is missing
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Score a listing stipend against the user's minimum.
///
/// Meeting the minimum scores 1, anything lower scores the ratio
/// `stipend / minimum`. Without a minimum the rule is neutral.
pub fn stipend_score(stipend: f64, min_stipend: Option<f64>) -> f64 {
    match min_stipend {
        None => NEUTRAL_SCORE,
        Some(min) if min <= 0.0 => 1.0,
        Some(min) if stipend >= min => 1.0,
        Some(min) => (stipend / min).clamp(0.0, 1.0),
    }
}

/// 1 when applications are still open on the availability date, 0 otherwise
pub fn deadline_score(deadline: Option<NaiveDate>, available_from: NaiveDate) -> f64 {
    match deadline {
        None => NEUTRAL_SCORE,
        Some(deadline) if deadline >= available_from => 1.0,
        Some(_) => 0.0,
    }
}

pub fn is_expired(deadline: Option<NaiveDate>, available_from: NaiveDate) -> bool {
    deadline.is_some_and(|d| d < available_from)
}
