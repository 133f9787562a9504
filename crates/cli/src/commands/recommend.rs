use serde_json::json;

use super::{dispatch_skill, CommandResult};

#[derive(Debug, clap::Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Taste preference, e.g. 辣 or 清淡")]
    pub taste: Option<String>,
    #[arg(long, help = "Cuisine, e.g. 川菜 or 日料")]
    pub cuisine: Option<String>,
    #[arg(long, help = "Free-text keywords")]
    pub keywords: Option<String>,
    #[arg(long, help = "Maximum average cost per person")]
    pub budget_max: Option<u32>,
    #[arg(long, help = "Coordinates as lng,lat")]
    pub location: Option<String>,
    #[arg(long, help = "Street address to geocode")]
    pub address: Option<String>,
    #[arg(long, help = "City name")]
    pub city: Option<String>,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    dispatch_skill(
        "recommend",
        json!({
            "taste": args.taste,
            "cuisine": args.cuisine,
            "keywords": args.keywords,
            "budget_max": args.budget_max,
            "location": args.location,
            "address": args.address,
            "city": args.city,
        }),
    )
}
