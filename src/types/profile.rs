// src/types/profile.rs
use serde::{Deserialize, Serialize};

/// Skills and preferences a run is matched against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub preferred_categories: Vec<String>,
    #[serde(default)]
    pub preferred_work_type: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_budget: Option<u64>,
}
