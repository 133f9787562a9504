//! Query strategy selection: pick the single primary search term from the
//! caller's intent, highest-priority signal first.

use crate::catalog::{cuisines_for_taste, FALLBACK_KEYWORD};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanSource {
    Cuisine,
    Keywords,
    Taste,
    Generic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryPlan {
    pub keyword: String,
    pub source: PlanSource,
    /// Taste-mapped cuisines beyond the primary term, in priority order;
    /// consumed by the multi-category merge step only.
    pub merge_cuisines: Vec<String>,
}

impl QueryPlan {
    /// True when the plan searches with something narrower than the generic
    /// fallback term, which is what makes scope broadening worthwhile.
    pub fn narrowed(&self) -> bool {
        self.source != PlanSource::Generic
    }

    /// The cuisine term to look up a provider category for, when the plan
    /// was driven by a cuisine rather than free text.
    pub fn cuisine_term(&self) -> Option<&str> {
        match self.source {
            PlanSource::Cuisine | PlanSource::Taste => Some(&self.keyword),
            PlanSource::Keywords | PlanSource::Generic => None,
        }
    }
}

/// Priority order: explicit cuisine, explicit keywords, first taste-mapped
/// cuisine, generic fallback. Only a taste-driven plan reserves the
/// remaining mapped cuisines for the merge step.
pub fn select_query_plan(
    taste: Option<&str>,
    cuisine: Option<&str>,
    keywords: Option<&str>,
) -> QueryPlan {
    if let Some(cuisine) = non_empty(cuisine) {
        return QueryPlan {
            keyword: cuisine.to_string(),
            source: PlanSource::Cuisine,
            merge_cuisines: Vec::new(),
        };
    }

    if let Some(keywords) = non_empty(keywords) {
        return QueryPlan {
            keyword: keywords.to_string(),
            source: PlanSource::Keywords,
            merge_cuisines: Vec::new(),
        };
    }

    if let Some(taste) = non_empty(taste) {
        let cuisines = cuisines_for_taste(taste);
        if let Some((first, rest)) = cuisines.split_first() {
            return QueryPlan {
                keyword: (*first).to_string(),
                source: PlanSource::Taste,
                merge_cuisines: rest.iter().map(|cuisine| (*cuisine).to_string()).collect(),
            };
        }
    }

    QueryPlan {
        keyword: FALLBACK_KEYWORD.to_string(),
        source: PlanSource::Generic,
        merge_cuisines: Vec::new(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
