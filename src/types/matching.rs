// src/types/matching.rs
//! Evaluation outcomes, ranked results and run statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{JobRecord, UserProfile};

/// Upper bound on reasons and concerns kept per evaluation.
pub const MAX_NOTES: usize = 3;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Clamp an oracle score into `[0, 100]`; non-finite values count as zero.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(MIN_SCORE, MAX_SCORE)
    } else {
        MIN_SCORE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStatus {
    Excluded,
    Scored,
}

impl FilterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterStatus::Excluded => "excluded",
            FilterStatus::Scored => "scored",
        }
    }
}

/// One entry of the evaluation ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatch {
    pub job: JobRecord,
    pub relevance_score: f64,
    pub match_reasons: Vec<String>,
    pub concerns: Vec<String>,
    pub quick_filtered: bool,
    pub filter_reason: String,
}

impl JobMatch {
    /// Entry for a record excluded by the quick filter chain.
    pub fn filtered(job: JobRecord, reason: impl Into<String>) -> Self {
        Self {
            job,
            relevance_score: MIN_SCORE,
            match_reasons: Vec::new(),
            concerns: Vec::new(),
            quick_filtered: true,
            filter_reason: reason.into(),
        }
    }

    /// Entry for a record scored by the oracle.
    pub fn scored(
        job: JobRecord,
        raw_score: f64,
        mut match_reasons: Vec<String>,
        mut concerns: Vec<String>,
    ) -> Self {
        match_reasons.truncate(MAX_NOTES);
        concerns.truncate(MAX_NOTES);

        Self {
            job,
            relevance_score: clamp_score(raw_score),
            match_reasons,
            concerns,
            quick_filtered: false,
            filter_reason: String::new(),
        }
    }

    /// Zero-score entry for a record the oracle could not evaluate.
    pub fn failed(job: JobRecord, concern: impl Into<String>) -> Self {
        Self::scored(job, MIN_SCORE, Vec::new(), vec![concern.into()])
    }

    pub fn filter_status(&self) -> FilterStatus {
        if self.quick_filtered {
            FilterStatus::Excluded
        } else {
            FilterStatus::Scored
        }
    }
}

/// Shortlist entry as written to the matching-results document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub job: JobRecord,
    pub relevance_score: f64,
    pub match_reasons: Vec<String>,
    pub concerns: Vec<String>,
}

impl From<&JobMatch> for RankedMatch {
    fn from(m: &JobMatch) -> Self {
        Self {
            job: m.job.clone(),
            relevance_score: m.relevance_score,
            match_reasons: m.match_reasons.clone(),
            concerns: m.concerns.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingResults {
    pub run_id: Uuid,
    pub run_timestamp: DateTime<Utc>,
    pub user_profile: UserProfile,
    pub ranked_matches: Vec<RankedMatch>,
}

impl MatchingResults {
    pub fn new(user_profile: &UserProfile, ranked: &[JobMatch]) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            run_timestamp: Utc::now(),
            user_profile: user_profile.clone(),
            ranked_matches: ranked.iter().map(RankedMatch::from).collect(),
        }
    }
}

/// Aggregate counts over a run's ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub total: usize,
    pub filtered_out: usize,
    pub scored: usize,
    pub recommended: usize,
    pub by_budget_type: BTreeMap<String, usize>,
}

impl EvaluationStats {
    pub fn from_ledger(ledger: &[JobMatch], recommended: usize) -> Self {
        let mut stats = Self {
            total: ledger.len(),
            recommended,
            ..Self::default()
        };

        for entry in ledger {
            if entry.quick_filtered {
                stats.filtered_out += 1;
            } else {
                stats.scored += 1;
            }
            *stats
                .by_budget_type
                .entry(entry.job.budget.budget_type.to_string())
                .or_insert(0) += 1;
        }

        stats
    }
}
