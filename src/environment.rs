// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::config_manager::{FetchConfig, MatchingConfig, OracleConfig};
use crate::core::FsOps;
use crate::matching::filters::{default_filters, QuickFilter};
use crate::types::UserProfile;

/// Storage locations for one deployment environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub html_path: PathBuf,
    pub jobs_path: PathBuf,
    pub matches_path: PathBuf,
    pub log_path: PathBuf,
}

/// On-disk layout of `config.yaml`.
#[derive(Debug, Deserialize)]
pub(crate) struct ConfigFile {
    pub local: EnvironmentConfig,
    pub production: EnvironmentConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default = "default_filters")]
    pub filters: Vec<QuickFilter>,
    #[serde(default)]
    pub user_profile: UserProfile,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "{} not found. The matcher cannot run without configuration.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Take the section for `environment`, anything but "production" is local.
    pub fn select_environment(&self, environment: &str) -> &EnvironmentConfig {
        match environment {
            "production" => &self.production,
            _ => &self.local,
        }
    }
}

impl EnvironmentConfig {
    pub fn get_environment() -> String {
        std::env::var("JOB_MATCHER_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// Make every path absolute relative to `base`.
    pub fn resolved(&self, base: &Path) -> Self {
        Self {
            html_path: FsOps::normalize_path(base, &self.html_path),
            jobs_path: FsOps::normalize_path(base, &self.jobs_path),
            matches_path: FsOps::normalize_path(base, &self.matches_path),
            log_path: FsOps::normalize_path(base, &self.log_path),
        }
    }

    /// Ensure all configured directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.html_path,
            &self.jobs_path,
            &self.matches_path,
            &self.log_path,
        ] {
            FsOps::ensure_dir_exists(dir).await?;
        }

        info!("All configured directories ensured to exist");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
local:
  html_path: data/html
  jobs_path: data/jobs
  matches_path: data/matches
  log_path: logs
production:
  html_path: /app/data/html
  jobs_path: /app/data/jobs
  matches_path: /app/data/matches
  log_path: /app/logs
"#;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let file = ConfigFile::parse(MINIMAL).unwrap();
        assert_eq!(file.matching, MatchingConfig::default());
        assert_eq!(file.filters, default_filters());
        assert!(file.user_profile.skills.is_empty());
    }

    #[test]
    fn test_select_environment() {
        let file = ConfigFile::parse(MINIMAL).unwrap();
        assert_eq!(
            file.select_environment("production").jobs_path,
            PathBuf::from("/app/data/jobs")
        );
        assert_eq!(
            file.select_environment("staging").jobs_path,
            PathBuf::from("data/jobs")
        );
    }

    #[test]
    fn test_resolved_keeps_absolute_paths() {
        let file = ConfigFile::parse(MINIMAL).unwrap();
        let local = file.local.resolved(Path::new("/srv/matcher"));
        assert_eq!(local.html_path, PathBuf::from("/srv/matcher/data/html"));

        let production = file.production.resolved(Path::new("/srv/matcher"));
        assert_eq!(production.log_path, PathBuf::from("/app/logs"));
    }

    #[tokio::test]
    async fn test_ensure_directories_creates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let file = ConfigFile::parse(MINIMAL).unwrap();
        let env = file.local.resolved(tmp.path());

        env.ensure_directories().await.unwrap();
        assert!(env.html_path.is_dir());
        assert!(env.matches_path.is_dir());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ConfigFile::read(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
