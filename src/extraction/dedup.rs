// src/extraction/dedup.rs
use std::collections::HashSet;
use tracing::info;

use crate::types::JobRecord;

/// Keep the first record for every `(title, client_name)` key, preserving
/// the relative order of survivors.
pub fn dedup_jobs(jobs: Vec<JobRecord>) -> Vec<JobRecord> {
    let before = jobs.len();
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(before);

    let unique: Vec<JobRecord> = jobs
        .into_iter()
        .filter(|job| seen.insert((job.title.clone(), job.client_name.clone())))
        .collect();

    if unique.len() < before {
        info!(
            "Dropped {} duplicate posting(s), {} remain",
            before - unique.len(),
            unique.len()
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::sample_job;

    #[test]
    fn test_same_key_collapses_to_first() {
        let first = sample_job();
        let mut second = sample_job();
        second.description = "a later copy".to_string();

        let result = dedup_jobs(vec![first.clone(), second]);
        assert_eq!(result, vec![first]);
    }

    #[test]
    fn test_order_preserved_and_distinct_clients_kept() {
        let a = sample_job();
        let mut b = sample_job();
        b.client_name = "Other Client".to_string();
        let mut c = sample_job();
        c.title = "Another Title".to_string();

        let result = dedup_jobs(vec![a.clone(), b.clone(), a.clone(), c.clone(), b.clone()]);
        assert_eq!(result, vec![a, b, c]);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup_jobs(Vec::new()).is_empty());
    }
}
