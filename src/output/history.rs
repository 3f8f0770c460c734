// src/output/history.rs
//! Reading back artifacts written by earlier runs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::result_writer::{EXTRACTED_JOBS_PREFIX, MATCHING_RESULTS_PREFIX};
use crate::core::FsOps;
use crate::types::{JobRecord, MatchingResults};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub path: PathBuf,
    pub run_timestamp: DateTime<Utc>,
    pub recommended: usize,
    pub top_title: Option<String>,
}

/// Load an extraction artifact.
pub async fn read_extracted_jobs(path: &Path) -> Result<Vec<JobRecord>> {
    let content = FsOps::read_file_safe(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse extracted jobs from {}", path.display()))
}

/// Most recently modified extraction artifact in `jobs_dir`, if any.
pub async fn latest_extraction_artifact(jobs_dir: &Path) -> Result<Option<PathBuf>> {
    FsOps::latest_file(jobs_dir, EXTRACTED_JOBS_PREFIX, "json").await
}

/// Past matching runs, newest first. Unreadable files are skipped.
pub async fn list_history(matches_dir: &Path, limit: usize) -> Result<Vec<HistoryEntry>> {
    let files = FsOps::files_by_mtime(matches_dir, MATCHING_RESULTS_PREFIX, "json").await?;
    let mut history = Vec::new();

    for path in files.into_iter().take(limit) {
        let parsed = FsOps::read_file_safe(&path)
            .await
            .and_then(|c| serde_json::from_str::<MatchingResults>(&c).map_err(Into::into));

        match parsed {
            Ok(results) => history.push(HistoryEntry {
                run_timestamp: results.run_timestamp,
                recommended: results.ranked_matches.len(),
                top_title: results.ranked_matches.first().map(|m| m.job.title.clone()),
                path,
            }),
            Err(e) => warn!("Skipping unreadable results file {}: {}", path.display(), e),
        }
    }

    Ok(history)
}
