// src/core/config_manager.rs
//! Unified configuration: storage paths, matching knobs, oracle backend,
//! fetch defaults, filter chain and user profile, loaded once per process.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::environment::{ConfigFile, EnvironmentConfig};
use crate::matching::filters::QuickFilter;
use crate::types::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Several records per oracle call, scores only
    Batch,
    /// One record per call, with reasons and concerns
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub min_score: f64,
    pub max_jobs: usize,
    pub batch_size: usize,
    pub scoring_mode: ScoringMode,
    pub temperature: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: 70.0,
            max_jobs: 5,
            batch_size: 3,
            scoring_mode: ScoringMode::Batch,
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleBackend {
    OpenaiCompatible,
    Ollama,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub backend: OracleBackend,
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::OpenaiCompatible,
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            api_key_env: Some("DEEPSEEK_API_KEY".to_string()),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Site root used to resolve relative posting links
    pub site_url: String,
    pub query: Vec<(String, String)>,
    pub max_pages: u32,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            site_url: "https://crowdworks.jp".to_string(),
            query: vec![
                ("order".to_string(), "new".to_string()),
                ("hide_expired".to_string(), "true".to_string()),
            ],
            max_pages: 1,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment_name: String,
    pub environment: EnvironmentConfig,
    pub matching: MatchingConfig,
    pub oracle: OracleConfig,
    pub fetch: FetchConfig,
    pub filters: Vec<QuickFilter>,
    pub user_profile: UserProfile,
}

impl ConfigManager {
    /// Load configuration from `path`, resolving storage paths against the
    /// current directory. Called before logging is set up, so it stays quiet.
    pub fn load(path: &Path) -> Result<Self> {
        let environment_name = EnvironmentConfig::get_environment();

        let file = ConfigFile::read(path)?;
        let base_dir = std::env::current_dir().context("Failed to get current directory")?;

        Ok(Self::from_file(file, &environment_name, &base_dir))
    }

    pub(crate) fn from_file(file: ConfigFile, environment_name: &str, base_dir: &Path) -> Self {
        let environment = file.select_environment(environment_name).resolved(base_dir);

        Self {
            environment_name: environment_name.to_string(),
            environment,
            matching: file.matching,
            oracle: file.oracle,
            fetch: file.fetch,
            filters: file.filters,
            user_profile: file.user_profile,
        }
    }

    /// Ensure all required directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        self.environment.ensure_directories().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const FULL: &str = r#"
local:
  html_path: data/html
  jobs_path: data/jobs
  matches_path: data/matches
  log_path: logs
production:
  html_path: /app/html
  jobs_path: /app/jobs
  matches_path: /app/matches
  log_path: /app/logs
matching:
  min_score: 60
  batch_size: 5
  scoring_mode: single
oracle:
  backend: ollama
  base_url: http://127.0.0.1:11434
  model: llama3
  api_key_env: null
filters:
  - kind: fixed_price_only
  - kind: min_budget
user_profile:
  skills: [Python]
  min_budget: 30000
"#;

    #[test]
    fn test_from_file_applies_sections() {
        let file = ConfigFile::parse(FULL).unwrap();
        let config = ConfigManager::from_file(file, "local", Path::new("/work"));

        assert_eq!(config.environment.jobs_path, PathBuf::from("/work/data/jobs"));
        assert_eq!(config.matching.min_score, 60.0);
        assert_eq!(config.matching.batch_size, 5);
        assert_eq!(config.matching.max_jobs, 5);
        assert_eq!(config.matching.scoring_mode, ScoringMode::Single);
        assert_eq!(config.oracle.backend, OracleBackend::Ollama);
        assert_eq!(config.oracle.api_key_env, None);
        assert_eq!(config.oracle.timeout_seconds, 60);
        assert_eq!(
            config.filters,
            vec![QuickFilter::FixedPriceOnly, QuickFilter::MinBudget]
        );
        assert_eq!(config.user_profile.min_budget, Some(30_000));
        assert_eq!(config.fetch, FetchConfig::default());
    }
}
