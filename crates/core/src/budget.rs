//! Budget filtering over normalized venues. Cost values arrive as raw
//! provider text and parse failures always mean "unknown", never an error.

use crate::domain::Venue;

/// Parse a provider cost field (`"45"`, `"45元"`, `"45.0 元 "`) into whole
/// currency units, truncating fractions. Empty or unparseable text is
/// treated as unknown.
pub fn parse_cost(raw: &str) -> Option<u32> {
    let trimmed = raw.trim().trim_end_matches('元').trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| *value >= 0.0).map(|value| value as u32)
}

/// Keep venues whose known cost is at or below `ceiling`. Unknown-cost
/// venues are kept only when `include_unknown` is set. Input order is
/// preserved.
pub fn filter_by_budget(venues: &[Venue], ceiling: u32, include_unknown: bool) -> Vec<Venue> {
    venues
        .iter()
        .filter(|venue| match parse_cost(&venue.cost) {
            Some(cost) => cost <= ceiling,
            None => include_unknown,
        })
        .cloned()
        .collect()
}

/// The loosened ceiling for the second budget strategy: 1.5x, truncated.
pub fn loosened_ceiling(ceiling: u32) -> u32 {
    ceiling.saturating_mul(3) / 2
}
