use serde_json::json;

use super::{dispatch_skill, CommandResult};

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    #[arg(long, help = "Search keyword")]
    pub query: String,
    #[arg(long, help = "City for city-anchored search")]
    pub city: Option<String>,
    #[arg(long, help = "Coordinates as lng,lat for nearby search")]
    pub location: Option<String>,
    #[arg(long, help = "Named place to geocode and search around")]
    pub location_name: Option<String>,
    #[arg(long, help = "Maximum average cost per person")]
    pub budget_max: Option<u32>,
    #[arg(long, help = "Only venues that can deliver")]
    pub delivery_only: bool,
    #[arg(long, help = "Search radius in meters")]
    pub radius_m: Option<u32>,
}

pub fn run(args: SearchArgs) -> CommandResult {
    dispatch_skill(
        "search",
        json!({
            "query": args.query,
            "city": args.city,
            "location": args.location,
            "location_name": args.location_name,
            "budget_max": args.budget_max,
            "delivery_only": args.delivery_only,
            "radius_m": args.radius_m,
        }),
    )
}
