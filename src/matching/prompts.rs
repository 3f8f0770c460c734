// src/matching/prompts.rs
//! Prompt text sent to the oracle

use serde::Serialize;

use crate::types::{JobRecord, UserProfile};
use crate::utils::truncate_chars;

pub const EVALUATOR_SYSTEM: &str =
    "You are a helpful assistant that evaluates how well freelance jobs match a user's profile. \
     Always answer with a single JSON object and nothing else.";

/// Descriptions are cut to keep batch prompts bounded.
const DESCRIPTION_CHAR_LIMIT: usize = 800;

#[derive(Debug, Serialize)]
struct JobSummary<'a> {
    id: usize,
    title: &'a str,
    category: &'a str,
    budget: String,
    description: String,
}

impl<'a> JobSummary<'a> {
    fn new(id: usize, job: &'a JobRecord) -> Self {
        Self {
            id,
            title: &job.title,
            category: job.category.as_deref().unwrap_or(""),
            budget: format!("{} ({})", job.budget.budget_type, job.budget.range_label()),
            description: truncate_chars(&job.description, DESCRIPTION_CHAR_LIMIT),
        }
    }
}

fn profile_section(profile: &UserProfile) -> String {
    let experience = profile
        .experience_years
        .map(|y| format!("{} years", y))
        .unwrap_or_else(|| "not stated".to_string());
    let min_budget = profile
        .min_budget
        .map(|b| b.to_string())
        .unwrap_or_else(|| "not stated".to_string());

    format!(
        r#"USER PROFILE:
- Skills: {}
- Experience: {}
- Preferred categories: {}
- Preferred work type: {}
- Minimum budget: {}
- About: {}"#,
        profile.skills.join(", "),
        experience,
        profile.preferred_categories.join(", "),
        profile.preferred_work_type.join(", "),
        min_budget,
        profile.description
    )
}

/// Prompt scoring several jobs at once; ids are positions within the batch.
pub fn batch_prompt(jobs: &[&JobRecord], profile: &UserProfile) -> String {
    let summaries: Vec<JobSummary<'_>> = jobs
        .iter()
        .enumerate()
        .map(|(id, job)| JobSummary::new(id, job))
        .collect();
    let jobs_json =
        serde_json::to_string_pretty(&summaries).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Rate how relevant each job is to the user.

{}

JOBS:
{}

Return JSON in exactly this shape, with one entry for every job id above:
{{"scores": [{{"id": 0, "relevance_score": <0-100>}}]}}"#,
        profile_section(profile),
        jobs_json
    )
}

/// Prompt for one job, asking for reasons and concerns as well as a score.
pub fn single_prompt(job: &JobRecord, profile: &UserProfile) -> String {
    format!(
        r#"Analyse how well this job fits the user.

{}

JOB:
- Title: {}
- Category: {}
- Budget: {} ({})
- Description: {}

Return JSON in exactly this shape:
{{"relevance_score": <0-100>, "match_reasons": [up to 3 short strings], "concerns": [up to 3 short strings]}}"#,
        profile_section(profile),
        job.title,
        job.category.as_deref().unwrap_or(""),
        job.budget.budget_type,
        job.budget.range_label(),
        job.description
    )
}
