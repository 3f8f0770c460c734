// src/output/result_writer.rs
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::FsOps;
use crate::matching::RankedOutcome;
use crate::types::{EvaluationStats, JobMatch, JobRecord, MatchingResults, UserProfile};
use crate::utils::artifact_timestamp;

pub const EXTRACTED_JOBS_PREFIX: &str = "extracted_jobs_";
pub const MATCHING_RESULTS_PREFIX: &str = "matching_results_";
pub const ALL_EVALUATIONS_PREFIX: &str = "all_evaluations_";
pub const EVALUATION_STATS_PREFIX: &str = "evaluation_stats_";

const NOTE_SEPARATOR: &str = " | ";

pub const LEDGER_COLUMNS: [&str; 11] = [
    "title",
    "category",
    "budget_type",
    "min_amount",
    "max_amount",
    "relevance_score",
    "filter_status",
    "filter_reason",
    "match_reasons",
    "concerns",
    "url",
];

/// Paths of the artifacts written for one matching run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    pub results: PathBuf,
    pub ledger: PathBuf,
    pub stats: PathBuf,
}

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    title: &'a str,
    category: &'a str,
    budget_type: &'static str,
    min_amount: Option<u64>,
    max_amount: Option<u64>,
    relevance_score: String,
    filter_status: &'static str,
    filter_reason: &'a str,
    match_reasons: String,
    concerns: String,
    url: &'a str,
}

impl<'a> From<&'a JobMatch> for LedgerRow<'a> {
    fn from(m: &'a JobMatch) -> Self {
        Self {
            title: &m.job.title,
            category: m.job.category.as_deref().unwrap_or(""),
            budget_type: m.job.budget.budget_type.as_str(),
            min_amount: m.job.budget.min_amount,
            max_amount: m.job.budget.max_amount,
            relevance_score: format!("{:.1}", m.relevance_score),
            filter_status: m.filter_status().as_str(),
            filter_reason: &m.filter_reason,
            match_reasons: m.match_reasons.join(NOTE_SEPARATOR),
            concerns: m.concerns.join(NOTE_SEPARATOR),
            url: m.job.url.as_deref().unwrap_or(""),
        }
    }
}

/// Persists timestamped run artifacts. Nothing is ever overwritten or rolled
/// back; a failed write surfaces as an error.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    jobs_dir: PathBuf,
    matches_dir: PathBuf,
}

impl ResultWriter {
    pub fn new(jobs_dir: impl Into<PathBuf>, matches_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
            matches_dir: matches_dir.into(),
        }
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    /// Write the extraction artifact and return its path.
    pub async fn write_extracted_jobs(&self, jobs: &[JobRecord]) -> Result<PathBuf> {
        let path = self.jobs_dir.join(format!(
            "{}{}.json",
            EXTRACTED_JOBS_PREFIX,
            artifact_timestamp()
        ));
        let body = serde_json::to_vec_pretty(jobs).context("Failed to serialize extracted jobs")?;
        FsOps::write_file_safe(&path, &body).await?;

        info!("Saved {} job(s) to {}", jobs.len(), path.display());
        Ok(path)
    }

    /// Write ranked results, the full ledger and its statistics.
    pub async fn write_run(
        &self,
        profile: &UserProfile,
        outcome: &RankedOutcome,
    ) -> Result<(RunArtifacts, EvaluationStats)> {
        let stamp = artifact_timestamp();
        let artifacts = RunArtifacts {
            results: self
                .matches_dir
                .join(format!("{}{}.json", MATCHING_RESULTS_PREFIX, stamp)),
            ledger: self
                .matches_dir
                .join(format!("{}{}.csv", ALL_EVALUATIONS_PREFIX, stamp)),
            stats: self
                .matches_dir
                .join(format!("{}{}.json", EVALUATION_STATS_PREFIX, stamp)),
        };

        let results = MatchingResults::new(profile, &outcome.ranked);
        let body =
            serde_json::to_vec_pretty(&results).context("Failed to serialize matching results")?;
        FsOps::write_file_safe(&artifacts.results, &body).await?;

        let csv = ledger_csv(&outcome.ledger)?;
        FsOps::write_file_safe(&artifacts.ledger, &csv).await?;

        let stats = EvaluationStats::from_ledger(&outcome.ledger, outcome.ranked.len());
        let body = serde_json::to_vec_pretty(&stats).context("Failed to serialize statistics")?;
        FsOps::write_file_safe(&artifacts.stats, &body).await?;

        info!(
            "Saved {} ranked match(es) to {} and {} ledger row(s) to {}",
            results.ranked_matches.len(),
            artifacts.results.display(),
            outcome.ledger.len(),
            artifacts.ledger.display()
        );
        Ok((artifacts, stats))
    }
}

/// Render the evaluation ledger as CSV, one row per evaluated record.
pub fn ledger_csv(ledger: &[JobMatch]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(LEDGER_COLUMNS)
        .context("Failed to write ledger header")?;
    for entry in ledger {
        writer
            .serialize(LedgerRow::from(entry))
            .with_context(|| format!("Failed to write ledger row for '{}'", entry.job.title))?;
    }
    writer.into_inner().context("Failed to flush ledger CSV")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::rank;
    use crate::types::fixtures::{job, sample_profile};
    use crate::types::BudgetType;

    fn ledger() -> Vec<JobMatch> {
        vec![
            JobMatch::filtered(job("hourly gig", BudgetType::Hourly), "not a fixed-price job"),
            JobMatch::scored(
                job("llm tool", BudgetType::FixedPrice),
                91.0,
                vec!["python".to_string(), "llm".to_string()],
                vec!["short deadline".to_string()],
            ),
            JobMatch::failed(job("flaky", BudgetType::FixedPrice), "evaluation failed: timeout"),
        ]
    }

    #[test]
    fn test_ledger_csv_columns_and_rows() {
        let csv = String::from_utf8(ledger_csv(&ledger()).unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "title,category,budget_type,min_amount,max_amount,relevance_score,filter_status,filter_reason,match_reasons,concerns,url"
        );

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][2], "hourly");
        assert_eq!(&rows[0][6], "excluded");
        assert_eq!(&rows[0][7], "not a fixed-price job");
        assert_eq!(&rows[1][5], "91.0");
        assert_eq!(&rows[1][6], "scored");
        assert_eq!(&rows[1][8], "python | llm");
        assert_eq!(&rows[2][9], "evaluation failed: timeout");
    }

    #[test]
    fn test_empty_ledger_still_has_header() {
        let csv = String::from_utf8(ledger_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv.trim_end(), LEDGER_COLUMNS.join(","));
    }

    #[tokio::test]
    async fn test_write_run_produces_three_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(tmp.path().join("jobs"), tmp.path().join("matches"));
        let outcome = rank(ledger(), 70.0, 5);

        let (artifacts, stats) = writer.write_run(&sample_profile(), &outcome).await.unwrap();
        assert!(artifacts.results.exists());
        assert!(artifacts.ledger.exists());
        assert!(artifacts.stats.exists());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.filtered_out, 1);
        assert_eq!(stats.recommended, 1);

        let results: MatchingResults =
            serde_json::from_slice(&std::fs::read(&artifacts.results).unwrap()).unwrap();
        assert_eq!(results.user_profile, sample_profile());
        assert_eq!(results.ranked_matches.len(), 1);
        assert_eq!(results.ranked_matches[0].job.title, "llm tool");
    }

    #[tokio::test]
    async fn test_write_extracted_jobs_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(tmp.path().join("jobs"), tmp.path().join("matches"));
        let jobs = vec![job("a", BudgetType::FixedPrice), job("b", BudgetType::Other)];

        let path = writer.write_extracted_jobs(&jobs).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(EXTRACTED_JOBS_PREFIX));

        let back: Vec<JobRecord> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(back, jobs);
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "file, not a dir").unwrap();

        let writer = ResultWriter::new(blocker.join("jobs"), blocker.join("matches"));
        assert!(writer.write_extracted_jobs(&[]).await.is_err());
    }
}
