//! Text rendering for venue lists, venue details, and relaxation notices.
//! This is the only place relaxation tags become display text.

use tablescout_core::domain::{RelaxationTag, Venue};
use tablescout_core::engine::SearchIntent;

/// Venues shown in a rendered list.
pub const LIST_LIMIT: usize = 10;

const UNKNOWN: &str = "n/a";

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        UNKNOWN
    } else {
        value
    }
}

fn tag_text(tag: &RelaxationTag) -> String {
    match tag {
        RelaxationTag::ScopeBroadened => {
            "broadened the search beyond the requested cuisine".to_string()
        }
        RelaxationTag::BudgetLoosened { ceiling } => {
            format!("loosened the budget ceiling to {ceiling}")
        }
        RelaxationTag::IncludedUnknownCost => "included venues with unknown price".to_string(),
        RelaxationTag::ScopeBroadenedForBudget => {
            "broadened the search to find venues within budget".to_string()
        }
        RelaxationTag::UnfilteredFallback => {
            "no venue matched the budget; showing nearby venues unfiltered".to_string()
        }
    }
}

/// Comma-joined trail of applied relaxations, or `None` when nothing was
/// relaxed.
pub fn relaxation_notice(tags: &[RelaxationTag]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let joined = tags.iter().map(tag_text).collect::<Vec<_>>().join(", ");
    Some(format!("Note: {joined}"))
}

pub fn render_venue(venue: &Venue, index: usize) -> String {
    let mut lines = vec![
        format!("**{index}. {}**", or_unknown(&venue.name)),
        format!("   category: {}", or_unknown(&venue.category)),
        format!("   rating: {}", or_unknown(&venue.rating)),
        format!("   cost: {}", or_unknown(&venue.cost)),
        format!("   address: {}", or_unknown(&venue.address)),
    ];
    if !venue.distance.is_empty() {
        lines.push(format!("   distance: {}", venue.distance));
    }
    if !venue.phone.is_empty() {
        lines.push(format!("   phone: {}", venue.phone));
    }
    lines.join("\n")
}

pub fn render_venue_list(venues: &[Venue]) -> String {
    venues
        .iter()
        .take(LIST_LIMIT)
        .enumerate()
        .map(|(position, venue)| render_venue(venue, position + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_detail(venue: &Venue) -> String {
    let mut lines = vec![
        format!("# {}", or_unknown(&venue.name)),
        String::new(),
        format!("**category**: {}", or_unknown(&venue.category)),
        format!("**rating**: {}", or_unknown(&venue.rating)),
        format!("**cost**: {}", or_unknown(&venue.cost)),
        format!("**address**: {}", or_unknown(&venue.address)),
        format!("**phone**: {}", or_unknown(&venue.phone)),
        format!("**hours**: {}", or_unknown(&venue.business_hours)),
    ];
    if !venue.tag.is_empty() {
        lines.push(format!("**known for**: {}", venue.tag));
    }
    lines.join("\n")
}

fn intent_conditions(intent: &SearchIntent) -> Vec<String> {
    let mut conditions = Vec::new();
    if let Some(taste) = intent.taste.as_deref().filter(|taste| !taste.is_empty()) {
        conditions.push(format!("taste {taste}"));
    }
    if let Some(budget_max) = intent.budget_max {
        conditions.push(format!("budget within {budget_max}"));
    }
    if let Some(cuisine) = intent.cuisine.as_deref().filter(|cuisine| !cuisine.is_empty()) {
        conditions.push(format!("cuisine {cuisine}"));
    }
    conditions
}

pub fn recommend_header(intent: &SearchIntent, count: usize) -> String {
    let conditions = intent_conditions(intent);
    if conditions.is_empty() {
        format!("Found {count} venues for you")
    } else {
        format!("Found {count} venues for you ({})", conditions.join(", "))
    }
}

pub fn no_result_message(intent: &SearchIntent) -> String {
    let conditions = intent_conditions(intent);
    let mut message = String::from("No venues matched the request");
    if !conditions.is_empty() {
        message.push_str(&format!(" ({})", conditions.join(", ")));
    }
    message.push_str("; consider relaxing the conditions and trying again.");
    message
}

pub fn search_header(query: &str, nearby: bool, city: &str, count: usize) -> String {
    if nearby {
        format!("Found {count} venues near you for \"{query}\"")
    } else {
        format!("Found {count} venues in {city} for \"{query}\"")
    }
}
