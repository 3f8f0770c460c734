// src/pipeline.rs
//! Stage orchestration: raw documents → extract → dedup → quick filter →
//! oracle scoring → rank → persist. Stages run strictly one after another.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::core::config_manager::MatchingConfig;
use crate::core::{ConfigManager, FsOps};
use crate::extraction::{dedup_jobs, JobExtractor};
use crate::matching::{rank, BatchScorer, FilterChain, RankedOutcome};
use crate::oracle::{build_oracle, Oracle, UnavailableOracle};
use crate::output::{latest_extraction_artifact, read_extracted_jobs, ResultWriter, RunArtifacts};
use crate::types::{EvaluationStats, JobMatch, JobRecord, UserProfile};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no extraction artifact found in {}", dir.display())]
    MissingArtifact { dir: PathBuf },

    #[error("no raw documents found in {}", dir.display())]
    NoDocuments { dir: PathBuf },
}

/// Everything a completed matching run produced.
#[derive(Debug, Clone)]
pub struct MatchRun {
    pub source: PathBuf,
    pub outcome: RankedOutcome,
    pub artifacts: RunArtifacts,
    pub stats: EvaluationStats,
}

/// The extraction half of the pipeline. It parses documents and writes the
/// extraction artifact without touching the oracle.
#[derive(Debug, Clone)]
pub struct Extraction {
    extractor: JobExtractor,
    writer: ResultWriter,
}

impl Extraction {
    pub fn new(writer: ResultWriter) -> Self {
        Self {
            extractor: JobExtractor::new(),
            writer,
        }
    }

    pub fn from_config(config: &ConfigManager) -> Self {
        let writer = ResultWriter::new(
            &config.environment.jobs_path,
            &config.environment.matches_path,
        );
        Self::new(writer).with_extractor(JobExtractor::new().with_base_url(&config.fetch.site_url))
    }

    pub fn with_extractor(mut self, extractor: JobExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Extract and deduplicate postings from in-memory documents.
    pub fn extract(&self, documents: &[String]) -> Vec<JobRecord> {
        let jobs: Vec<JobRecord> = documents
            .iter()
            .flat_map(|html| self.extractor.extract_jobs(html))
            .collect();
        dedup_jobs(jobs)
    }

    /// Read documents from disk, extract them and write the extraction
    /// artifact. Returns the artifact path.
    pub async fn extract_files(&self, paths: &[PathBuf]) -> Result<PathBuf> {
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            info!("Reading raw document {}", path.display());
            documents.push(FsOps::read_file_safe(path).await?);
        }

        let jobs = self.extract(&documents);
        info!(
            "{} unique job(s) extracted from {} document(s)",
            jobs.len(),
            documents.len()
        );
        self.writer.write_extracted_jobs(&jobs).await
    }

    /// Extract every html document in `html_dir`.
    pub async fn extract_directory(&self, html_dir: &Path) -> Result<PathBuf> {
        let paths = FsOps::list_files_with_extension(html_dir, "html").await?;
        if paths.is_empty() {
            return Err(PipelineError::NoDocuments {
                dir: html_dir.to_path_buf(),
            }
            .into());
        }
        self.extract_files(&paths).await
    }
}

pub struct MatchingPipeline {
    extraction: Extraction,
    filters: FilterChain,
    scorer: BatchScorer,
    matching: MatchingConfig,
}

impl MatchingPipeline {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        matching: MatchingConfig,
        filters: FilterChain,
        extraction: Extraction,
    ) -> Self {
        Self {
            extraction,
            filters,
            scorer: BatchScorer::new(oracle, matching.batch_size, matching.temperature),
            matching,
        }
    }

    /// Build the pipeline and its oracle backend from loaded configuration.
    ///
    /// A backend that cannot be set up (a missing API key, say) does not stop
    /// the run: every job it would have scored gets 0 and a concern naming
    /// the problem.
    pub fn from_config(config: &ConfigManager) -> Self {
        let oracle = build_oracle(&config.oracle).unwrap_or_else(|e| {
            error!("LLM oracle unavailable, jobs will score 0: {}", e);
            Arc::new(UnavailableOracle::new(e)) as Arc<dyn Oracle>
        });

        Self::new(
            oracle,
            config.matching.clone(),
            FilterChain::new(config.filters.clone()),
            Extraction::from_config(config),
        )
    }

    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }

    /// Quick filter, score and rank `jobs`. Oracle failures are absorbed by
    /// the scorer, so this never fails.
    pub async fn evaluate(&self, jobs: Vec<JobRecord>, profile: &UserProfile) -> RankedOutcome {
        let total = jobs.len();
        let mut slots: Vec<Option<JobMatch>> = Vec::with_capacity(total);
        let mut eligible = Vec::new();
        let mut eligible_slots = Vec::new();

        for job in jobs {
            let verdict = self.filters.apply(&job, profile);
            if verdict.exclude {
                slots.push(Some(JobMatch::filtered(job, verdict.reason)));
            } else {
                eligible_slots.push(slots.len());
                slots.push(None);
                eligible.push(job);
            }
        }

        info!(
            "{} of {} job(s) passed quick filters; scoring in {:?} mode",
            eligible.len(),
            total,
            self.matching.scoring_mode
        );

        let scored = self
            .scorer
            .score(self.matching.scoring_mode, &eligible, profile)
            .await;
        for (slot, entry) in eligible_slots.into_iter().zip(scored) {
            slots[slot] = Some(entry);
        }

        let ledger: Vec<JobMatch> = slots.into_iter().flatten().collect();
        rank(ledger, self.matching.min_score, self.matching.max_jobs)
    }

    /// Match the jobs of one explicit extraction artifact.
    pub async fn match_artifact(&self, artifact: &Path, profile: &UserProfile) -> Result<MatchRun> {
        let jobs = read_extracted_jobs(artifact).await?;
        info!("Evaluating {} job(s) from {}", jobs.len(), artifact.display());

        let outcome = self.evaluate(jobs, profile).await;
        let (artifacts, stats) = self.extraction.writer.write_run(profile, &outcome).await?;
        log_summary(&outcome, &stats);

        Ok(MatchRun {
            source: artifact.to_path_buf(),
            outcome,
            artifacts,
            stats,
        })
    }

    /// Match the most recently modified extraction artifact.
    pub async fn match_latest(&self, profile: &UserProfile) -> Result<MatchRun> {
        let dir = self.extraction.writer.jobs_dir();
        let artifact = latest_extraction_artifact(dir)
            .await?
            .ok_or_else(|| PipelineError::MissingArtifact {
                dir: dir.to_path_buf(),
            })?;
        self.match_artifact(&artifact, profile).await
    }

    /// Extract `paths` and match the artifact that extraction produced.
    pub async fn run(&self, paths: &[PathBuf], profile: &UserProfile) -> Result<MatchRun> {
        let artifact = self.extraction.extract_files(paths).await?;
        self.match_artifact(&artifact, profile).await
    }
}

fn log_summary(outcome: &RankedOutcome, stats: &EvaluationStats) {
    info!(
        "Run summary: {} evaluated, {} filtered out, {} scored, {} recommended",
        stats.total, stats.filtered_out, stats.scored, stats.recommended
    );
    for (budget_type, count) in &stats.by_budget_type {
        info!("  {}: {}", budget_type, count);
    }

    if let Some(top) = outcome.ranked.first() {
        info!(
            "Best match: {} (score {:.1})",
            top.job.title, top.relevance_score
        );
        for reason in &top.match_reasons {
            info!("  - {}", reason);
        }
    }
}
