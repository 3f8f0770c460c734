// src/lib.rs
//! Freelance job matcher: turns rendered marketplace listing pages into a
//! ranked shortlist of postings for one user profile, scored by an LLM.

pub mod cli;
pub mod core;
pub mod environment;
pub mod extraction;
pub mod fetch;
pub mod matching;
pub mod oracle;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod utils;

pub use pipeline::{Extraction, MatchRun, MatchingPipeline, PipelineError};
