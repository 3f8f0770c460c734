// src/matching/ranker.rs
use std::cmp::Ordering;

use crate::types::JobMatch;

/// Shortlist plus the untouched ledger it was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedOutcome {
    pub ranked: Vec<JobMatch>,
    pub ledger: Vec<JobMatch>,
}

/// Keep scored entries at or above `min_score`, highest first, at most
/// `max_jobs` of them. Equal scores keep their ledger order. Quick-filtered
/// entries are never ranked.
pub fn rank(ledger: Vec<JobMatch>, min_score: f64, max_jobs: usize) -> RankedOutcome {
    let mut ranked: Vec<JobMatch> = ledger
        .iter()
        .filter(|m| !m.quick_filtered && m.relevance_score >= min_score)
        .cloned()
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(max_jobs);

    RankedOutcome { ranked, ledger }
}
