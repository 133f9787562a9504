use serde_json::{json, Value};

/// The agent card advertised at `/.well-known/agent-card.json` and via the
/// `agent/info` RPC method.
pub fn agent_card() -> Value {
    json!({
        "name": "tablescout",
        "description": "Food venue search and recommendation agent backed by map provider POI data",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoint": "/a2a",
        "skills": [
            {
                "id": "recommend",
                "description": "Recommend venues from taste, cuisine, budget, and location hints; relaxes constraints when strict matching finds nothing",
                "params": ["request", "taste", "cuisine", "keywords", "budget_max", "location", "address", "city", "ip"]
            },
            {
                "id": "search",
                "description": "Search venues by explicit keyword, optionally near a named place, with a strict budget filter",
                "params": ["query", "location", "location_name", "city", "budget_max", "delivery_only", "radius_m"]
            },
            {
                "id": "detail",
                "description": "Show full details for one venue, by id or by name",
                "params": ["venue_id", "venue_name", "city"]
            }
        ]
    })
}
