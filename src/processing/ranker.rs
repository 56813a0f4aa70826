//! Ordering and truncation of scored listings

use crate::processing::scoring::ScoredListing;
use std::cmp::Ordering;

/// Compare listing ids numerically when both are integers, otherwise as text.
/// Integer ids sort before the rest so the order stays total.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Sort by final score, highest first, and keep the first `k`
pub fn rank(mut scored: Vec<ScoredListing>, k: usize) -> Vec<ScoredListing> {
    scored.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| compare_ids(&a.listing.id, &b.listing.id))
    });
    scored.truncate(k);
    scored
}
