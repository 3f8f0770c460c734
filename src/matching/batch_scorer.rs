// src/matching/batch_scorer.rs
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::prompts::{batch_prompt, single_prompt, EVALUATOR_SYSTEM};
use crate::core::config_manager::ScoringMode;
use crate::oracle::{Oracle, OracleError, OracleRequest};
use crate::types::{JobMatch, JobRecord, UserProfile};

pub const MISSING_SCORE_CONCERN: &str = "oracle returned no score for this job";

#[derive(Debug, Deserialize)]
struct BatchScoreResponse {
    scores: Vec<ScoreEntry>,
}

#[derive(Debug, Deserialize)]
struct ScoreEntry {
    id: usize,
    #[serde(alias = "score")]
    relevance_score: f64,
}

#[derive(Debug, Deserialize)]
struct SingleEvaluation {
    relevance_score: f64,
    #[serde(default)]
    match_reasons: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
}

fn failure_concern(e: &OracleError) -> String {
    format!("evaluation failed: {}", e)
}

/// Scores quick-filter survivors through the oracle.
///
/// Batches are sent strictly one after another. Oracle failures never escape:
/// a failed call turns every record it covered into a zero-score match
/// carrying a concern that describes the failure.
pub struct BatchScorer {
    oracle: Arc<dyn Oracle>,
    batch_size: usize,
    temperature: f32,
}

impl BatchScorer {
    pub fn new(oracle: Arc<dyn Oracle>, batch_size: usize, temperature: f32) -> Self {
        Self {
            oracle,
            batch_size: batch_size.max(1),
            temperature,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Score `jobs` in the given mode; output order follows input order.
    pub async fn score(
        &self,
        mode: ScoringMode,
        jobs: &[JobRecord],
        profile: &UserProfile,
    ) -> Vec<JobMatch> {
        match mode {
            ScoringMode::Batch => self.score_batches(jobs, profile).await,
            ScoringMode::Single => self.evaluate_each(jobs, profile).await,
        }
    }

    pub async fn score_batches(&self, jobs: &[JobRecord], profile: &UserProfile) -> Vec<JobMatch> {
        let total_batches = jobs.len().div_ceil(self.batch_size);
        let mut matches = Vec::with_capacity(jobs.len());

        for (index, batch) in jobs.chunks(self.batch_size).enumerate() {
            info!(
                "Scoring batch {}/{} ({} job(s)) via {}",
                index + 1,
                total_batches,
                batch.len(),
                self.oracle.name()
            );
            matches.extend(self.score_batch(batch, profile).await);
        }

        matches
    }

    async fn score_batch(&self, batch: &[JobRecord], profile: &UserProfile) -> Vec<JobMatch> {
        let refs: Vec<&JobRecord> = batch.iter().collect();
        let request = OracleRequest {
            system: EVALUATOR_SYSTEM.to_string(),
            prompt: batch_prompt(&refs, profile),
            temperature: self.temperature,
            structured: true,
        };

        let response = match self.request_batch(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Batch of {} job(s) failed: {}", batch.len(), e);
                let concern = failure_concern(&e);
                return batch
                    .iter()
                    .map(|job| JobMatch::failed(job.clone(), concern.clone()))
                    .collect();
            }
        };

        let mut scores: HashMap<usize, f64> = HashMap::with_capacity(batch.len());
        for entry in response.scores {
            if entry.id >= batch.len() {
                warn!("Ignoring score for unknown id {}", entry.id);
                continue;
            }
            scores.entry(entry.id).or_insert(entry.relevance_score);
        }

        batch
            .iter()
            .enumerate()
            .map(|(id, job)| match scores.get(&id) {
                Some(&score) => JobMatch::scored(job.clone(), score, Vec::new(), Vec::new()),
                None => {
                    warn!("No score returned for '{}'", job.title);
                    JobMatch::failed(job.clone(), MISSING_SCORE_CONCERN)
                }
            })
            .collect()
    }

    async fn request_batch(&self, request: &OracleRequest) -> Result<BatchScoreResponse, OracleError> {
        let reply = self.oracle.complete(request).await?;
        reply.parse_json()
    }

    /// Score one record at a time, asking for reasons and concerns too.
    pub async fn evaluate_each(&self, jobs: &[JobRecord], profile: &UserProfile) -> Vec<JobMatch> {
        let mut matches = Vec::with_capacity(jobs.len());
        for (index, job) in jobs.iter().enumerate() {
            info!("Evaluating job {}/{}: {}", index + 1, jobs.len(), job.title);
            matches.push(self.evaluate_single(job, profile).await);
        }
        matches
    }

    pub async fn evaluate_single(&self, job: &JobRecord, profile: &UserProfile) -> JobMatch {
        let request = OracleRequest {
            system: EVALUATOR_SYSTEM.to_string(),
            prompt: single_prompt(job, profile),
            temperature: self.temperature,
            structured: true,
        };

        let result = match self.oracle.complete(&request).await {
            Ok(reply) => reply.parse_json::<SingleEvaluation>(),
            Err(e) => Err(e),
        };

        match result {
            Ok(eval) => JobMatch::scored(
                job.clone(),
                eval.relevance_score,
                eval.match_reasons,
                eval.concerns,
            ),
            Err(e) => {
                error!("Evaluation of '{}' failed: {}", job.title, e);
                JobMatch::failed(job.clone(), failure_concern(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::testing::ScriptedOracle;
    use crate::types::fixtures::{job, sample_profile};
    use crate::types::BudgetType;

    fn jobs(n: usize) -> Vec<JobRecord> {
        (0..n)
            .map(|i| job(&format!("job {}", i), BudgetType::FixedPrice))
            .collect()
    }

    fn scorer(oracle: Arc<ScriptedOracle>, batch_size: usize) -> BatchScorer {
        BatchScorer::new(oracle, batch_size, 0.1)
    }

    #[tokio::test]
    async fn test_scores_map_by_id_and_clamp() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(r#"{"scores":[{"id":1,"relevance_score":140},{"id":0,"relevance_score":95}]}"#),
        );
        let result = scorer(oracle.clone(), 3)
            .score_batches(&jobs(2), &sample_profile())
            .await;

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].relevance_score, 95.0);
        assert_eq!(result[1].relevance_score, 100.0);
        assert_eq!(oracle.requests().len(), 1);
        assert!(oracle.requests()[0].structured);
    }

    #[tokio::test]
    async fn test_missing_id_gets_zero_with_concern() {
        let oracle = Arc::new(ScriptedOracle::new().reply(r#"{"scores":[{"id":0,"score":60}]}"#));
        let result = scorer(oracle, 3).score_batches(&jobs(2), &sample_profile()).await;

        assert_eq!(result[0].relevance_score, 60.0);
        assert_eq!(result[1].relevance_score, 0.0);
        assert_eq!(result[1].concerns, vec![MISSING_SCORE_CONCERN]);
    }

    #[tokio::test]
    async fn test_transport_failure_zeroes_whole_batch() {
        let oracle = Arc::new(ScriptedOracle::new().fail("connection reset"));
        let result = scorer(oracle, 3).score_batches(&jobs(3), &sample_profile()).await;

        assert_eq!(result.len(), 3);
        for m in &result {
            assert_eq!(m.relevance_score, 0.0);
            assert_eq!(m.concerns.len(), 1);
            assert!(m.concerns[0].contains("connection reset"));
        }
    }

    #[tokio::test]
    async fn test_unparseable_reply_zeroes_whole_batch() {
        let oracle = Arc::new(ScriptedOracle::new().reply("I think job 0 is great"));
        let result = scorer(oracle, 3).score_batches(&jobs(2), &sample_profile()).await;

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|m| m.relevance_score == 0.0 && !m.concerns.is_empty()));
    }

    #[tokio::test]
    async fn test_batches_are_bounded_and_sequential() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .reply(r#"{"scores":[{"id":0,"relevance_score":10},{"id":1,"relevance_score":20}]}"#)
                .fail("timeout")
                .reply(r#"{"scores":[{"id":0,"relevance_score":50}]}"#),
        );
        let result = scorer(oracle.clone(), 2)
            .score_batches(&jobs(5), &sample_profile())
            .await;

        assert_eq!(oracle.requests().len(), 3);
        let scores: Vec<f64> = result.iter().map(|m| m.relevance_score).collect();
        assert_eq!(scores, vec![10.0, 20.0, 0.0, 0.0, 50.0]);
        assert_eq!(result[4].job.title, "job 4");
    }

    #[tokio::test]
    async fn test_single_mode_keeps_reasons_and_concerns() {
        let oracle = Arc::new(ScriptedOracle::new().reply(
            r#"{"relevance_score": 88, "match_reasons": ["a","b","c","d"], "concerns": ["tight deadline"]}"#,
        ));
        let result = scorer(oracle, 3)
            .score(ScoringMode::Single, &jobs(1), &sample_profile())
            .await;

        assert_eq!(result[0].relevance_score, 88.0);
        assert_eq!(result[0].match_reasons, vec!["a", "b", "c"]);
        assert_eq!(result[0].concerns, vec!["tight deadline"]);
    }

    #[tokio::test]
    async fn test_single_mode_failure_is_absorbed() {
        let oracle = Arc::new(ScriptedOracle::new().fail("boom").reply(r#"{"relevance_score": 75}"#));
        let result = scorer(oracle, 3).evaluate_each(&jobs(2), &sample_profile()).await;

        assert_eq!(result[0].relevance_score, 0.0);
        assert!(result[0].concerns[0].contains("boom"));
        assert_eq!(result[1].relevance_score, 75.0);
        assert!(result[1].match_reasons.is_empty());
    }

    #[test]
    fn test_batch_size_floor_is_one() {
        let oracle = Arc::new(ScriptedOracle::new());
        assert_eq!(scorer(oracle, 0).batch_size(), 1);
    }
}
