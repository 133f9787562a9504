//! The search-and-relaxation decision engine.
//!
//! Orchestrates provider calls for the two entry paths, merges related
//! category results, and loosens constraints in a fixed order until a
//! usable result set exists or every strategy is exhausted. Every branch
//! returns a (possibly empty) outcome; provider failures ride along as an
//! error marker and never cross this boundary as an `Err`.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::budget::{filter_by_budget, loosened_ceiling};
use crate::catalog::{DELIVERY_KEYWORD, FALLBACK_KEYWORD, FALLBACK_LIMIT, MERGE_THRESHOLD};
use crate::domain::{
    RelaxationTag, ResolvedLocation, SearchAnchor, SearchOutcome, SearchQuery,
};
use crate::gateway::ProviderGateway;
use crate::strategy::select_query_plan;

/// Search parameters for the taste/cuisine entry path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchIntent {
    pub taste: Option<String>,
    pub cuisine: Option<String>,
    pub keywords: Option<String>,
    pub budget_max: Option<u32>,
}

/// Raw location hints accepted from callers, strongest signal first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocationHint {
    pub coordinates: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub ip: Option<String>,
}

/// Input to the single-pass composed search path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposedQuery {
    pub query: String,
    pub coordinates: Option<String>,
    /// Named place to geocode; search degrades to city-anchored mode when
    /// geocoding fails.
    pub place_name: Option<String>,
    pub city: Option<String>,
    pub budget_max: Option<u32>,
    pub delivery_only: bool,
    pub radius_m: Option<u32>,
}

/// Result of the composed path. This path filters the budget strictly once
/// and reports an emptied result as-is; `budget_emptied` lets the caller
/// explain that outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedOutcome {
    pub outcome: SearchOutcome,
    /// True when the search was anchored to coordinates rather than a city.
    pub nearby: bool,
    pub budget_emptied: bool,
}

/// Request-independent defaults, set once at construction from config.
#[derive(Clone, Debug)]
pub struct EngineDefaults {
    pub city: String,
    pub radius_m: u32,
    pub page_size: u32,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self { city: "北京".to_string(), radius_m: 3000, page_size: 20 }
    }
}

/// The engine instance: constructed once per process with its gateway and
/// defaults, then shared by reference across request handlers.
pub struct RelaxationEngine {
    gateway: Arc<dyn ProviderGateway>,
    defaults: EngineDefaults,
}

impl RelaxationEngine {
    pub fn new(gateway: Arc<dyn ProviderGateway>, defaults: EngineDefaults) -> Self {
        Self { gateway, defaults }
    }

    pub fn gateway(&self) -> &Arc<dyn ProviderGateway> {
        &self.gateway
    }

    pub fn default_city(&self) -> &str {
        &self.defaults.city
    }

    /// Canonicalize a location hint: supplied coordinates, then geocoded
    /// address, then IP location, then city name, then the default city.
    /// Never fails; the weakest outcome is city-level at the default city.
    pub async fn resolve_location(&self, hint: &LocationHint) -> ResolvedLocation {
        if let Some(coordinates) = hint.coordinates.as_deref().filter(|c| looks_like_coordinates(c))
        {
            return ResolvedLocation {
                coordinates: Some(coordinates.to_string()),
                city: self.city_or_default(hint.city.as_deref()),
            };
        }

        if let Some(address) = non_empty(hint.address.as_deref()) {
            if let Some(resolved) = self.gateway.geocode(address, hint.city.as_deref()).await {
                return ResolvedLocation {
                    coordinates: Some(resolved),
                    city: self.city_or_default(hint.city.as_deref()),
                };
            }
        }

        if let Ok(located) = self.gateway.ip_locate(hint.ip.as_deref()).await {
            if !located.city.is_empty() {
                return ResolvedLocation { coordinates: located.coordinates, city: located.city };
            }
        }

        ResolvedLocation::city_level(self.city_or_default(hint.city.as_deref()))
    }

    /// The taste/cuisine entry path: primary search per the query plan,
    /// multi-category top-up for thin taste-driven results, scope
    /// broadening when nothing matched, then the budget ladder.
    pub async fn recommend_search(
        &self,
        intent: &SearchIntent,
        at: &ResolvedLocation,
    ) -> SearchOutcome {
        let plan = select_query_plan(
            intent.taste.as_deref(),
            intent.cuisine.as_deref(),
            intent.keywords.as_deref(),
        );
        let category = plan.cuisine_term().and_then(|term| self.gateway.cuisine_category(term));

        debug!(keyword = %plan.keyword, category = ?category, "primary search");
        let mut outcome = self.run_search(&plan.keyword, category, at).await;

        if !plan.merge_cuisines.is_empty()
            && !outcome.is_empty()
            && outcome.venues.len() < MERGE_THRESHOLD
        {
            self.merge_categories(&mut outcome, &plan.merge_cuisines, at).await;
        }

        if outcome.is_empty() && plan.narrowed() {
            let mut broader = self.run_search(FALLBACK_KEYWORD, None, at).await;
            if !broader.is_empty() {
                broader.tags.push(RelaxationTag::ScopeBroadened);
                outcome = broader;
            }
        }

        if outcome.is_empty() {
            return outcome;
        }

        match intent.budget_max {
            Some(ceiling) => self.apply_budget_ladder(outcome, ceiling, plan.narrowed(), at).await,
            None => outcome,
        }
    }

    /// The single-pass composed path: resolve a named place if given, run
    /// one search, filter the budget strictly once. No relaxation ladder.
    pub async fn composed_search(&self, request: &ComposedQuery) -> ComposedOutcome {
        let mut keyword = request.query.trim().to_string();
        if request.delivery_only {
            keyword = format!("{keyword} {DELIVERY_KEYWORD}");
        }

        let city = self.city_or_default(request.city.as_deref());
        let mut coordinates =
            request.coordinates.as_deref().filter(|c| looks_like_coordinates(c)).map(str::to_string);
        if coordinates.is_none() {
            if let Some(place) = non_empty(request.place_name.as_deref()) {
                coordinates = self.gateway.geocode(place, Some(&city)).await;
            }
        }

        let at = ResolvedLocation { coordinates, city };
        let nearby = at.coordinates.is_some();
        let radius_m = request.radius_m.unwrap_or(self.defaults.radius_m);
        let query = self.build_query(&keyword, None, &at, radius_m);
        let mut outcome = self.gateway.search(&query).await;

        let mut budget_emptied = false;
        if let Some(ceiling) = request.budget_max {
            if !outcome.is_empty() {
                let strict = filter_by_budget(&outcome.venues, ceiling, false);
                budget_emptied = strict.is_empty();
                outcome.count = strict.len();
                outcome.venues = strict;
            }
        }

        ComposedOutcome { outcome, nearby, budget_emptied }
    }

    /// First-match-wins budget ladder over an already gathered candidate
    /// set. Strategies two through five append their tag to the trail; a
    /// strict match adds nothing.
    async fn apply_budget_ladder(
        &self,
        outcome: SearchOutcome,
        ceiling: u32,
        narrowed: bool,
        at: &ResolvedLocation,
    ) -> SearchOutcome {
        let SearchOutcome { venues: candidates, mut tags, error, .. } = outcome;

        let strict = filter_by_budget(&candidates, ceiling, false);
        if !strict.is_empty() {
            return SearchOutcome { count: strict.len(), venues: strict, tags, error };
        }

        let raised = loosened_ceiling(ceiling);
        let loosened = filter_by_budget(&candidates, raised, false);
        if !loosened.is_empty() {
            tags.push(RelaxationTag::BudgetLoosened { ceiling: raised });
            return SearchOutcome { count: loosened.len(), venues: loosened, tags, error };
        }

        let with_unknown = filter_by_budget(&candidates, ceiling, true);
        if !with_unknown.is_empty() {
            tags.push(RelaxationTag::IncludedUnknownCost);
            return SearchOutcome { count: with_unknown.len(), venues: with_unknown, tags, error };
        }

        if narrowed {
            let broader = self.run_search(FALLBACK_KEYWORD, None, at).await;
            if !broader.is_empty() {
                let filtered = filter_by_budget(&broader.venues, ceiling, true);
                if !filtered.is_empty() {
                    tags.push(RelaxationTag::ScopeBroadenedForBudget);
                    return SearchOutcome {
                        count: filtered.len(),
                        venues: filtered,
                        tags,
                        error: broader.error,
                    };
                }
            }
        }

        let kept: Vec<_> = candidates.into_iter().take(FALLBACK_LIMIT).collect();
        tags.push(RelaxationTag::UnfilteredFallback);
        SearchOutcome { count: kept.len(), venues: kept, tags, error }
    }

    /// Top up a thin taste-driven result with the remaining mapped
    /// cuisines, one sequential search each. Venue ids already seen are
    /// skipped; order stays primary-first, then call order.
    async fn merge_categories(
        &self,
        outcome: &mut SearchOutcome,
        cuisines: &[String],
        at: &ResolvedLocation,
    ) {
        let mut seen: HashSet<String> =
            outcome.venues.iter().map(|venue| venue.id.clone()).collect();

        for cuisine in cuisines {
            let category = self.gateway.cuisine_category(cuisine);
            let extra = self.run_search(cuisine, category, at).await;
            for venue in extra.venues {
                if seen.insert(venue.id.clone()) {
                    outcome.venues.push(venue);
                }
            }
        }

        outcome.count = outcome.venues.len();
    }

    async fn run_search(
        &self,
        keyword: &str,
        category: Option<String>,
        at: &ResolvedLocation,
    ) -> SearchOutcome {
        let query = self.build_query(keyword, category, at, self.defaults.radius_m);
        self.gateway.search(&query).await
    }

    fn build_query(
        &self,
        keyword: &str,
        category: Option<String>,
        at: &ResolvedLocation,
        radius_m: u32,
    ) -> SearchQuery {
        let anchor = match &at.coordinates {
            Some(location) => {
                SearchAnchor::Coordinates { location: location.clone(), radius_m }
            }
            None => SearchAnchor::City { name: at.city.clone() },
        };
        SearchQuery {
            keyword: keyword.to_string(),
            category,
            anchor,
            page: 1,
            page_size: self.defaults.page_size,
        }
    }

    fn city_or_default(&self, city: Option<&str>) -> String {
        non_empty(city).unwrap_or(&self.defaults.city).to_string()
    }
}

fn looks_like_coordinates(value: &str) -> bool {
    value.contains(',') && !value.eq_ignore_ascii_case("unknown")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{
        ComposedQuery, EngineDefaults, LocationHint, RelaxationEngine, SearchIntent,
    };
    use crate::domain::{
        IpLocation, RelaxationTag, ResolvedLocation, SearchAnchor, SearchOutcome, SearchQuery,
        Venue,
    };
    use crate::gateway::{ProviderError, ProviderGateway};

    /// Test double that replays scripted search outcomes in call order and
    /// records every query it saw.
    #[derive(Default)]
    struct ScriptedGateway {
        searches: Mutex<VecDeque<SearchOutcome>>,
        seen_queries: Mutex<Vec<SearchQuery>>,
        geocode_result: Option<String>,
        ip_result: Option<IpLocation>,
    }

    impl ScriptedGateway {
        fn with_searches(outcomes: Vec<SearchOutcome>) -> Self {
            Self { searches: Mutex::new(outcomes.into()), ..Self::default() }
        }

        fn queries(&self) -> Vec<SearchQuery> {
            self.seen_queries.lock().expect("queries lock").clone()
        }
    }

    #[async_trait]
    impl ProviderGateway for ScriptedGateway {
        async fn search(&self, query: &SearchQuery) -> SearchOutcome {
            self.seen_queries.lock().expect("queries lock").push(query.clone());
            self.searches
                .lock()
                .expect("searches lock")
                .pop_front()
                .unwrap_or_else(|| SearchOutcome::from_venues(Vec::new()))
        }

        async fn detail(&self, id: &str) -> Result<Venue, ProviderError> {
            Err(ProviderError::NotFound(id.to_string()))
        }

        async fn geocode(&self, _address: &str, _city: Option<&str>) -> Option<String> {
            self.geocode_result.clone()
        }

        async fn ip_locate(&self, _ip: Option<&str>) -> Result<IpLocation, ProviderError> {
            self.ip_result
                .clone()
                .ok_or_else(|| ProviderError::Transport("ip lookup unavailable".to_string()))
        }

        fn cuisine_category(&self, cuisine: &str) -> Option<String> {
            match cuisine {
                "川菜" => Some("050116".to_string()),
                "湘菜" => Some("050119".to_string()),
                "火锅" => Some("050300".to_string()),
                _ => None,
            }
        }
    }

    fn engine(gateway: ScriptedGateway) -> (RelaxationEngine, Arc<ScriptedGateway>) {
        let gateway = Arc::new(gateway);
        (RelaxationEngine::new(gateway.clone(), EngineDefaults::default()), gateway)
    }

    fn venue(id: &str, cost: &str) -> Venue {
        Venue { id: id.to_string(), name: id.to_string(), cost: cost.to_string(), ..Venue::default() }
    }

    fn here() -> ResolvedLocation {
        ResolvedLocation { coordinates: Some("116.40,39.90".to_string()), city: "北京".to_string() }
    }

    /// Twelve venues: three with known cost 50/70/90, nine unknown.
    fn mixed_candidates() -> Vec<Venue> {
        let mut venues = vec![venue("k1", "50"), venue("k2", "70"), venue("k3", "90")];
        for index in 0..9 {
            venues.push(venue(&format!("u{index}"), ""));
        }
        venues
    }

    #[tokio::test]
    async fn strict_budget_match_carries_no_relaxation_tag() {
        let (engine, _) = engine(ScriptedGateway::with_searches(vec![SearchOutcome::from_venues(
            mixed_candidates(),
        )]));
        let intent = SearchIntent {
            cuisine: Some("川菜".to_string()),
            budget_max: Some(60),
            ..SearchIntent::default()
        };

        let outcome = engine.recommend_search(&intent, &here()).await;

        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.venues[0].id, "k1");
        assert!(outcome.tags.is_empty());
    }

    #[tokio::test]
    async fn unknown_cost_tier_fires_when_loosened_ceiling_still_empty() {
        let (engine, _) = engine(ScriptedGateway::with_searches(vec![SearchOutcome::from_venues(
            mixed_candidates(),
        )]));
        let intent = SearchIntent {
            cuisine: Some("川菜".to_string()),
            budget_max: Some(30),
            ..SearchIntent::default()
        };

        let outcome = engine.recommend_search(&intent, &here()).await;

        // 45 is still under every known cost, so the ladder lands on the
        // unknown-inclusive tier at the original ceiling.
        assert_eq!(outcome.count, 9);
        assert!(outcome.venues.iter().all(|venue| venue.cost.is_empty()));
        assert_eq!(outcome.tags, vec![RelaxationTag::IncludedUnknownCost]);
    }

    #[tokio::test]
    async fn loosened_ceiling_tier_tags_the_truncated_ceiling() {
        let venues = vec![venue("a", "70"), venue("b", "90")];
        let (engine, _) =
            engine(ScriptedGateway::with_searches(vec![SearchOutcome::from_venues(venues)]));
        let intent = SearchIntent {
            cuisine: Some("川菜".to_string()),
            budget_max: Some(51),
            ..SearchIntent::default()
        };

        let outcome = engine.recommend_search(&intent, &here()).await;

        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.venues[0].id, "a");
        assert_eq!(outcome.tags, vec![RelaxationTag::BudgetLoosened { ceiling: 76 }]);
    }

    #[tokio::test]
    async fn empty_primary_broadens_scope_before_budget_logic() {
        let broadened = vec![venue("x", "55")];
        let (engine, gateway) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(Vec::new()),
            SearchOutcome::from_venues(broadened),
        ]));
        let intent = SearchIntent {
            cuisine: Some("寿司".to_string()),
            budget_max: Some(60),
            ..SearchIntent::default()
        };

        let outcome = engine.recommend_search(&intent, &here()).await;

        let queries = gateway.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].keyword, "寿司");
        assert_eq!(queries[1].keyword, "美食");
        assert_eq!(queries[1].category, None);
        assert_eq!(outcome.venues[0].id, "x");
        assert_eq!(outcome.tags, vec![RelaxationTag::ScopeBroadened]);
    }

    #[tokio::test]
    async fn empty_primary_without_budget_still_broadens_scope() {
        let (engine, gateway) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(Vec::new()),
            SearchOutcome::from_venues(vec![venue("x", "")]),
        ]));
        let intent = SearchIntent { cuisine: Some("寿司".to_string()), ..SearchIntent::default() };

        let outcome = engine.recommend_search(&intent, &here()).await;

        assert_eq!(gateway.queries().len(), 2);
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.tags, vec![RelaxationTag::ScopeBroadened]);
    }

    #[tokio::test]
    async fn exhausted_searches_return_empty_outcome_verbatim() {
        let (engine, _) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::failed("timeout talking to provider"),
            SearchOutcome::from_venues(Vec::new()),
        ]));
        let intent = SearchIntent { cuisine: Some("寿司".to_string()), ..SearchIntent::default() };

        let outcome = engine.recommend_search(&intent, &here()).await;

        assert!(outcome.is_empty());
        assert_eq!(outcome.error.as_deref(), Some("timeout talking to provider"));
    }

    #[tokio::test]
    async fn taste_merge_tops_up_thin_results_without_duplicates() {
        let primary = vec![venue("a", ""), venue("b", "")];
        let xiang = vec![venue("b", ""), venue("c", "")];
        let hotpot = vec![venue("a", ""), venue("d", "")];
        let (engine, gateway) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(primary),
            SearchOutcome::from_venues(xiang),
            SearchOutcome::from_venues(hotpot),
        ]));
        let intent = SearchIntent { taste: Some("辣".to_string()), ..SearchIntent::default() };

        let outcome = engine.recommend_search(&intent, &here()).await;

        let queries = gateway.queries();
        assert_eq!(queries[0].keyword, "川菜");
        assert_eq!(queries[0].category.as_deref(), Some("050116"));
        assert_eq!(queries[1].keyword, "湘菜");
        assert_eq!(queries[2].keyword, "火锅");

        let ids: Vec<&str> = outcome.venues.iter().map(|venue| venue.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        assert_eq!(outcome.count, 4);
        assert!(outcome.tags.is_empty());
    }

    #[tokio::test]
    async fn merge_is_skipped_for_explicit_cuisine() {
        let (engine, gateway) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(vec![venue("a", "")]),
        ]));
        let intent = SearchIntent {
            taste: Some("辣".to_string()),
            cuisine: Some("火锅".to_string()),
            ..SearchIntent::default()
        };

        let outcome = engine.recommend_search(&intent, &here()).await;

        assert_eq!(gateway.queries().len(), 1);
        assert_eq!(outcome.count, 1);
    }

    #[tokio::test]
    async fn merge_is_skipped_when_primary_already_meets_threshold() {
        let primary: Vec<Venue> =
            (0..10).map(|index| venue(&format!("p{index}"), "")).collect();
        let (engine, gateway) =
            engine(ScriptedGateway::with_searches(vec![SearchOutcome::from_venues(primary)]));
        let intent = SearchIntent { taste: Some("辣".to_string()), ..SearchIntent::default() };

        let outcome = engine.recommend_search(&intent, &here()).await;

        assert_eq!(gateway.queries().len(), 1);
        assert_eq!(outcome.count, 10);
    }

    #[tokio::test]
    async fn terminal_fallback_caps_at_five_and_tags_the_trail() {
        // Known costs far above even the loosened ceiling in both the
        // candidate set and the broadened re-search.
        let pricey: Vec<Venue> =
            (0..8).map(|index| venue(&format!("p{index}"), "500")).collect();
        let broadened: Vec<Venue> =
            (0..3).map(|index| venue(&format!("b{index}"), "400")).collect();
        let (engine, gateway) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(pricey),
            SearchOutcome::from_venues(broadened),
        ]));
        let intent = SearchIntent {
            cuisine: Some("川菜".to_string()),
            budget_max: Some(40),
            ..SearchIntent::default()
        };

        let outcome = engine.recommend_search(&intent, &here()).await;

        let queries = gateway.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].keyword, "美食");
        assert_eq!(outcome.count, 5);
        let ids: Vec<&str> = outcome.venues.iter().map(|venue| venue.id.as_str()).collect();
        assert_eq!(ids, ["p0", "p1", "p2", "p3", "p4"]);
        assert_eq!(outcome.tags, vec![RelaxationTag::UnfilteredFallback]);
    }

    #[tokio::test]
    async fn budget_scope_broadening_keeps_earlier_tags_in_order() {
        // Primary empty -> broadened result is all above even the loosened
        // ceiling with known costs absent, so the ladder reaches the
        // unknown-inclusive tier on top of the scope tag.
        let broadened = vec![venue("b0", "500"), venue("b1", "")];
        let (engine, _) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(Vec::new()),
            SearchOutcome::from_venues(broadened),
        ]));
        let intent = SearchIntent {
            cuisine: Some("寿司".to_string()),
            budget_max: Some(40),
            ..SearchIntent::default()
        };

        let outcome = engine.recommend_search(&intent, &here()).await;

        assert_eq!(
            outcome.tags,
            vec![RelaxationTag::ScopeBroadened, RelaxationTag::IncludedUnknownCost]
        );
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.venues[0].id, "b1");
    }

    #[tokio::test]
    async fn city_anchor_is_used_without_coordinates() {
        let (engine, gateway) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(vec![venue("a", "")]),
        ]));
        let at = ResolvedLocation::city_level("上海");

        engine.recommend_search(&SearchIntent::default(), &at).await;

        let queries = gateway.queries();
        assert_eq!(queries[0].anchor, SearchAnchor::City { name: "上海".to_string() });
        assert_eq!(queries[0].keyword, "美食");
    }

    #[tokio::test]
    async fn resolve_prefers_supplied_coordinates() {
        let gateway = ScriptedGateway {
            geocode_result: Some("121.47,31.23".to_string()),
            ..ScriptedGateway::default()
        };
        let (engine, _) = engine(gateway);

        let hint = LocationHint {
            coordinates: Some("116.40,39.90".to_string()),
            address: Some("春熙路".to_string()),
            city: Some("成都".to_string()),
            ip: None,
        };
        let resolved = engine.resolve_location(&hint).await;

        assert_eq!(resolved.coordinates.as_deref(), Some("116.40,39.90"));
        assert_eq!(resolved.city, "成都");
    }

    #[tokio::test]
    async fn resolve_geocodes_address_when_coordinates_missing() {
        let gateway = ScriptedGateway {
            geocode_result: Some("104.08,30.65".to_string()),
            ..ScriptedGateway::default()
        };
        let (engine, _) = engine(gateway);

        let hint = LocationHint {
            address: Some("春熙路".to_string()),
            city: Some("成都".to_string()),
            ..LocationHint::default()
        };
        let resolved = engine.resolve_location(&hint).await;

        assert_eq!(resolved.coordinates.as_deref(), Some("104.08,30.65"));
        assert_eq!(resolved.city, "成都");
    }

    #[tokio::test]
    async fn resolve_falls_back_to_ip_location() {
        let gateway = ScriptedGateway {
            ip_result: Some(IpLocation {
                coordinates: None,
                city: "杭州".to_string(),
                province: "浙江".to_string(),
            }),
            ..ScriptedGateway::default()
        };
        let (engine, _) = engine(gateway);

        let resolved = engine.resolve_location(&LocationHint::default()).await;

        assert_eq!(resolved.coordinates, None);
        assert_eq!(resolved.city, "杭州");
    }

    #[tokio::test]
    async fn resolve_rejects_the_unknown_sentinel_and_uses_default_city() {
        let (engine, _) = engine(ScriptedGateway::default());

        let hint = LocationHint {
            coordinates: Some("unknown".to_string()),
            ..LocationHint::default()
        };
        let resolved = engine.resolve_location(&hint).await;

        assert_eq!(resolved.coordinates, None);
        assert_eq!(resolved.city, "北京");
    }

    #[tokio::test]
    async fn composed_search_appends_delivery_qualifier_and_filters_strictly() {
        let venues = vec![venue("a", "30"), venue("b", "80"), venue("c", "")];
        let (engine, gateway) =
            engine(ScriptedGateway::with_searches(vec![SearchOutcome::from_venues(venues)]));

        let request = ComposedQuery {
            query: "烤鱼".to_string(),
            coordinates: Some("116.40,39.90".to_string()),
            budget_max: Some(50),
            delivery_only: true,
            ..ComposedQuery::default()
        };
        let result = engine.composed_search(&request).await;

        let queries = gateway.queries();
        assert_eq!(queries[0].keyword, "烤鱼 外卖");
        assert!(result.nearby);
        assert!(!result.budget_emptied);
        // Strict filtering: the unknown-cost venue is discarded on this path.
        assert_eq!(result.outcome.count, 1);
        assert_eq!(result.outcome.venues[0].id, "a");
    }

    #[tokio::test]
    async fn composed_search_degrades_to_city_mode_when_geocoding_fails() {
        let (engine, gateway) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(vec![venue("a", "")]),
        ]));

        let request = ComposedQuery {
            query: "早茶".to_string(),
            place_name: Some("珠江新城".to_string()),
            city: Some("广州".to_string()),
            ..ComposedQuery::default()
        };
        let result = engine.composed_search(&request).await;

        assert!(!result.nearby);
        let queries = gateway.queries();
        assert_eq!(queries[0].anchor, SearchAnchor::City { name: "广州".to_string() });
    }

    #[tokio::test]
    async fn composed_search_reports_emptied_budget_as_is() {
        let venues = vec![venue("a", "90"), venue("b", "")];
        let (engine, _) =
            engine(ScriptedGateway::with_searches(vec![SearchOutcome::from_venues(venues)]));

        let request = ComposedQuery {
            query: "日料".to_string(),
            coordinates: Some("116.40,39.90".to_string()),
            budget_max: Some(50),
            ..ComposedQuery::default()
        };
        let result = engine.composed_search(&request).await;

        assert!(result.budget_emptied);
        assert!(result.outcome.is_empty());
        assert!(result.outcome.tags.is_empty());
    }

    #[tokio::test]
    async fn composed_search_honors_radius_override() {
        let (engine, gateway) = engine(ScriptedGateway::with_searches(vec![
            SearchOutcome::from_venues(vec![venue("a", "")]),
        ]));

        let request = ComposedQuery {
            query: "面馆".to_string(),
            coordinates: Some("116.40,39.90".to_string()),
            radius_m: Some(500),
            ..ComposedQuery::default()
        };
        engine.composed_search(&request).await;

        let queries = gateway.queries();
        assert_eq!(
            queries[0].anchor,
            SearchAnchor::Coordinates { location: "116.40,39.90".to_string(), radius_m: 500 }
        );
    }
}
