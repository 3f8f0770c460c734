// src/output/mod.rs
//! Run artifacts: extraction snapshots, ranked results, evaluation ledger

pub mod history;
pub mod result_writer;

pub use history::{latest_extraction_artifact, list_history, read_extracted_jobs, HistoryEntry};
pub use result_writer::{ResultWriter, RunArtifacts};
