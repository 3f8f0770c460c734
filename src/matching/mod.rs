// src/matching/mod.rs
//! Quick filtering, oracle scoring and ranking of extracted jobs

pub mod batch_scorer;
pub mod filters;
pub mod prompts;
pub mod ranker;

pub use batch_scorer::BatchScorer;
pub use filters::{FilterChain, FilterVerdict, QuickFilter};
pub use ranker::{rank, RankedOutcome};
