use serde::{Deserialize, Serialize};

/// Normalized POI record. Both provider backends parse their wire formats
/// into this shape; fields the provider did not return are empty strings.
///
/// `id` is unique within a single provider's result set and is the dedup
/// key when merging result sets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub category: String,
    pub address: String,
    /// Coordinate string in canonical `lng,lat` order.
    pub location: String,
    pub phone: String,
    pub rating: String,
    /// Average cost per person as raw provider text; parsed lazily by the
    /// budget filter and treated as unknown when unparseable.
    pub cost: String,
    pub distance: String,
    pub business_hours: String,
    pub tag: String,
    pub city: String,
    pub district: String,
}

/// Where a single provider call is anchored. Exactly one mode per call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchAnchor {
    Coordinates { location: String, radius_m: u32 },
    City { name: String },
}

/// Input to one provider search call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    /// Provider category code or tag, when the backend has one for the term.
    pub category: Option<String>,
    pub anchor: SearchAnchor,
    pub page: u32,
    pub page_size: u32,
}

/// Canonical location for a request: precise coordinates when available,
/// otherwise city-level only. `city` is never empty; defaults are applied
/// during resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub coordinates: Option<String>,
    pub city: String,
}

impl ResolvedLocation {
    pub fn city_level(city: impl Into<String>) -> Self {
        Self { coordinates: None, city: city.into() }
    }
}

/// Result of an IP location lookup. Coordinates may be absent when the
/// provider only resolves to city granularity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IpLocation {
    pub coordinates: Option<String>,
    pub city: String,
    pub province: String,
}

/// One constraint-loosening step the engine actually applied, in order.
/// The trail is append-only and translated to display text only at the
/// presentation boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelaxationTag {
    /// The narrowed search term found nothing; re-ran with the generic term.
    ScopeBroadened,
    /// No venue within budget; accepted venues up to the loosened ceiling.
    BudgetLoosened { ceiling: u32 },
    /// Accepted venues whose cost is unknown alongside in-budget ones.
    IncludedUnknownCost,
    /// Re-ran with the generic term so the budget filter had data to work on.
    ScopeBroadenedForBudget,
    /// Every budget strategy came up empty; returning leading unfiltered venues.
    UnfilteredFallback,
}

/// Outcome of a search, relaxed or not. `error` carries a provider or
/// transport failure so callers can tell "no matches" from "search failed";
/// it never aborts the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub venues: Vec<Venue>,
    pub count: usize,
    pub tags: Vec<RelaxationTag>,
    pub error: Option<String>,
}

impl SearchOutcome {
    pub fn from_venues(venues: Vec<Venue>) -> Self {
        Self { count: venues.len(), venues, tags: Vec::new(), error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { venues: Vec::new(), count: 0, tags: Vec::new(), error: Some(message.into()) }
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}
