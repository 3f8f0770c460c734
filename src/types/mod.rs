// src/types/mod.rs
//! Data model shared by every pipeline stage

pub mod job;
pub mod matching;
pub mod profile;

pub use job::{Budget, BudgetType, JobRecord};
pub use matching::{
    EvaluationStats, FilterStatus, JobMatch, MatchingResults, RankedMatch,
};
pub use profile::UserProfile;
