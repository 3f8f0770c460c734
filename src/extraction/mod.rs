// src/extraction/mod.rs
//! Raw document → job record extraction

use thiserror::Error;

pub mod dedup;
pub mod job_extractor;
pub mod parsing;

pub use dedup::dedup_jobs;
pub use job_extractor::JobExtractor;
pub use parsing::{parse_budget_text, parse_date_text};

/// Per-posting extraction failure. Caught by the extractor, never surfaced
/// past a single document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing {0}")]
    MissingElement(&'static str),

    #[error("posting has no title text")]
    EmptyTitle,

    #[error("invalid posted date: {0:?}")]
    InvalidDate(String),
}
