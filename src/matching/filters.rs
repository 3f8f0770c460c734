// src/matching/filters.rs
//! Deterministic pre-screen run before any oracle call.
//!
//! Predicates are plain values in an ordered list, so adding a filter means
//! registering another [`QuickFilter`] (or listing it in `config.yaml`), not
//! touching the matcher.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{JobRecord, UserProfile};

pub const NOT_FIXED_PRICE_REASON: &str = "not a fixed-price job";
pub const BELOW_MIN_BUDGET_REASON: &str = "budget below the profile minimum";
pub const CATEGORY_NOT_ALLOWED_REASON: &str = "category not in the allow-list";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterVerdict {
    pub exclude: bool,
    pub reason: String,
}

impl FilterVerdict {
    pub fn pass() -> Self {
        Self {
            exclude: false,
            reason: String::new(),
        }
    }

    pub fn exclude(reason: impl Into<String>) -> Self {
        Self {
            exclude: true,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuickFilter {
    /// Drop anything that is not fixed-price compensation
    FixedPriceOnly,
    /// Drop postings whose upper bound is below `UserProfile::min_budget`.
    /// Postings without amounts pass.
    MinBudget,
    /// Keep only the listed categories; an empty list falls back to the
    /// profile's preferred categories.
    CategoryAllowList {
        #[serde(default)]
        categories: Vec<String>,
    },
}

impl QuickFilter {
    pub fn name(&self) -> &'static str {
        match self {
            QuickFilter::FixedPriceOnly => "fixed_price_only",
            QuickFilter::MinBudget => "min_budget",
            QuickFilter::CategoryAllowList { .. } => "category_allow_list",
        }
    }

    pub fn evaluate(&self, job: &JobRecord, profile: &UserProfile) -> FilterVerdict {
        match self {
            QuickFilter::FixedPriceOnly => {
                if job.budget.is_fixed_price() {
                    FilterVerdict::pass()
                } else {
                    FilterVerdict::exclude(NOT_FIXED_PRICE_REASON)
                }
            }
            QuickFilter::MinBudget => {
                let ceiling = job.budget.max_amount.or(job.budget.min_amount);
                match (profile.min_budget, ceiling) {
                    (Some(min), Some(amount)) if amount < min => {
                        FilterVerdict::exclude(BELOW_MIN_BUDGET_REASON)
                    }
                    _ => FilterVerdict::pass(),
                }
            }
            QuickFilter::CategoryAllowList { categories } => {
                let allowed = if categories.is_empty() {
                    &profile.preferred_categories
                } else {
                    categories
                };
                if allowed.is_empty() {
                    return FilterVerdict::pass();
                }
                match &job.category {
                    Some(category) if allowed.contains(category) => FilterVerdict::pass(),
                    _ => FilterVerdict::exclude(CATEGORY_NOT_ALLOWED_REASON),
                }
            }
        }
    }
}

pub fn default_filters() -> Vec<QuickFilter> {
    vec![QuickFilter::FixedPriceOnly]
}

/// Ordered, short-circuiting chain of quick filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChain {
    filters: Vec<QuickFilter>,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new(default_filters())
    }
}

impl FilterChain {
    pub fn new(filters: Vec<QuickFilter>) -> Self {
        Self { filters }
    }

    pub fn register(mut self, filter: QuickFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// First excluding verdict wins; a record passing every filter is kept.
    pub fn apply(&self, job: &JobRecord, profile: &UserProfile) -> FilterVerdict {
        for filter in &self.filters {
            let verdict = filter.evaluate(job, profile);
            if verdict.exclude {
                debug!(
                    "'{}' excluded by {}: {}",
                    job.title,
                    filter.name(),
                    verdict.reason
                );
                return verdict;
            }
        }

        debug!("'{}' passed quick filters", job.title);
        FilterVerdict::pass()
    }
}
