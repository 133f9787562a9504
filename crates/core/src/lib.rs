pub mod budget;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod gateway;
pub mod strategy;

pub use domain::{
    IpLocation, RelaxationTag, ResolvedLocation, SearchAnchor, SearchOutcome, SearchQuery, Venue,
};
pub use engine::{
    ComposedOutcome, ComposedQuery, EngineDefaults, LocationHint, RelaxationEngine, SearchIntent,
};
pub use gateway::{ProviderError, ProviderGateway};
pub use strategy::{select_query_plan, PlanSource, QueryPlan};
