//! Skill layer: the three caller-facing operations, dispatched by skill id
//! over an opaque parameter object. Handlers always produce renderable
//! text; only unknown skills and malformed parameters surface as errors.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use tablescout_core::engine::{ComposedQuery, LocationHint, RelaxationEngine, SearchIntent};

use crate::format::{
    no_result_message, recommend_header, relaxation_notice, render_detail, render_venue_list,
    search_header,
};
use crate::llm::{analyze_food_request, style_recommendation, LlmClient};

/// Skill ids accepted by `dispatch`, as advertised in the agent card.
pub const SKILL_IDS: &[&str] = &["recommend", "search", "detail"];

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("unknown skill `{0}` (available: recommend, search, detail)")]
    UnknownSkill(String),
    #[error("invalid parameters for `{skill}`: {message}")]
    InvalidParams { skill: String, message: String },
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecommendParams {
    /// Free-text request; analyzed by the LLM when one is configured.
    pub request: Option<String>,
    pub taste: Option<String>,
    #[serde(alias = "category")]
    pub cuisine: Option<String>,
    pub keywords: Option<String>,
    pub budget_max: Option<u32>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub ip: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(alias = "keyword")]
    pub query: Option<String>,
    pub location: Option<String>,
    pub location_name: Option<String>,
    pub city: Option<String>,
    pub budget_max: Option<u32>,
    #[serde(default)]
    pub delivery_only: bool,
    #[serde(alias = "radius")]
    pub radius_m: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DetailParams {
    #[serde(alias = "restaurant_id")]
    pub venue_id: Option<String>,
    #[serde(alias = "restaurant_name")]
    pub venue_name: Option<String>,
    pub city: Option<String>,
}

/// Owns the engine and optional LLM client; one instance per process,
/// shared by reference across request handlers.
pub struct SkillRouter {
    engine: RelaxationEngine,
    llm: Option<Arc<dyn LlmClient>>,
}

impl SkillRouter {
    pub fn new(engine: RelaxationEngine, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { engine, llm }
    }

    pub async fn dispatch(
        &self,
        skill_id: &str,
        params: serde_json::Value,
    ) -> Result<String, SkillError> {
        info!(event_name = "skill.dispatch", skill_id = %skill_id, "dispatching skill");
        match skill_id {
            "recommend" => Ok(self.recommend(parse("recommend", params)?).await),
            "search" => Ok(self.search(parse("search", params)?).await),
            "detail" => Ok(self.detail(parse("detail", params)?).await),
            other => Err(SkillError::UnknownSkill(other.to_string())),
        }
    }

    async fn recommend(&self, params: RecommendParams) -> String {
        let mut intent = SearchIntent {
            taste: params.taste,
            cuisine: params.cuisine,
            keywords: params.keywords,
            budget_max: params.budget_max,
        };

        let request_text =
            params.request.as_deref().map(str::trim).filter(|text| !text.is_empty());
        if let (Some(request), Some(llm)) = (request_text, self.llm.as_deref()) {
            let analyzed = analyze_food_request(llm, request).await;
            if intent.taste.is_none() {
                intent.taste = analyzed.taste;
            }
            if intent.cuisine.is_none() {
                intent.cuisine = analyzed.cuisine;
            }
            if intent.budget_max.is_none() {
                intent.budget_max = analyzed.budget_max;
            }
            if intent.keywords.is_none() && !analyzed.keywords.is_empty() {
                intent.keywords = Some(analyzed.keywords.join(" "));
            }
        }

        let hint = LocationHint {
            coordinates: params.location,
            address: params.address,
            city: params.city,
            ip: params.ip,
        };
        let at = self.engine.resolve_location(&hint).await;
        let outcome = self.engine.recommend_search(&intent, &at).await;

        if outcome.is_empty() {
            if let Some(error) = &outcome.error {
                return format!("The venue search failed ({error}); please try again later.");
            }
            return no_result_message(&intent);
        }

        let header = recommend_header(&intent, outcome.count);
        let body = render_venue_list(&outcome.venues);
        let mut response = format!("{header}\n\n{body}");
        if let Some(notice) = relaxation_notice(&outcome.tags) {
            response = format!("{notice}\n\n{response}");
        }

        if let (Some(request), Some(llm)) = (request_text, self.llm.as_deref()) {
            response = style_recommendation(llm, request, &outcome.venues, &response).await;
        }
        response
    }

    async fn search(&self, params: SearchParams) -> String {
        let Some(query) =
            params.query.as_deref().map(str::trim).filter(|query| !query.is_empty())
        else {
            return "A search keyword is required.".to_string();
        };

        let request = ComposedQuery {
            query: query.to_string(),
            coordinates: params.location,
            place_name: params.location_name,
            city: params.city.clone(),
            budget_max: params.budget_max,
            delivery_only: params.delivery_only,
            radius_m: params.radius_m,
        };
        let result = self.engine.composed_search(&request).await;

        if result.outcome.is_empty() {
            if let Some(error) = &result.outcome.error {
                return format!("The venue search failed ({error}); please try again later.");
            }
            if result.budget_emptied {
                return format!(
                    "Venues matched \"{query}\" but none had a known cost within the budget; \
                     raise the budget or drop the filter to see them."
                );
            }
            return format!("No venues found for \"{query}\"; try another keyword.");
        }

        let city = params.city.unwrap_or_else(|| self.engine.default_city().to_string());
        let header = search_header(query, result.nearby, &city, result.outcome.count);
        format!("{header}\n\n{}", render_venue_list(&result.outcome.venues))
    }

    async fn detail(&self, params: DetailParams) -> String {
        if let Some(id) = params.venue_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            if let Ok(venue) = self.engine.gateway().detail(id).await {
                return render_detail(&venue);
            }
        }

        // No id, or the id lookup failed: search by name and take the
        // first match.
        if let Some(name) =
            params.venue_name.as_deref().map(str::trim).filter(|name| !name.is_empty())
        {
            let request = ComposedQuery {
                query: name.to_string(),
                city: params.city,
                ..ComposedQuery::default()
            };
            let result = self.engine.composed_search(&request).await;
            if let Some(venue) = result.outcome.venues.first() {
                return render_detail(venue);
            }
        }

        "No venue information found; check that the name is correct.".to_string()
    }
}

fn parse<T: DeserializeOwned>(skill: &str, params: serde_json::Value) -> Result<T, SkillError> {
    serde_json::from_value(params).map_err(|error| SkillError::InvalidParams {
        skill: skill.to_string(),
        message: error.to_string(),
    })
}
