// src/cli.rs
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::core::config_manager::ScoringMode;
use crate::core::ConfigManager;
use crate::fetch::{FetchRequest, PageFetcher};
use crate::output::list_history;
use crate::pipeline::{Extraction, MatchRun, MatchingPipeline};

#[derive(Parser, Debug)]
#[command(name = "job-matcher")]
#[command(about = "Extract freelance job postings and rank them against your profile")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract postings from html documents (all of html_path when none given)
    Extract { files: Vec<PathBuf> },
    /// Score and rank an extraction artifact (latest one by default)
    Match {
        #[arg(long)]
        jobs: Option<PathBuf>,
        #[command(flatten)]
        overrides: MatchOverrides,
    },
    /// Extract then match in one go
    Run {
        files: Vec<PathBuf>,
        #[command(flatten)]
        overrides: MatchOverrides,
    },
    /// Download listing pages into html_path
    Fetch {
        url: String,
        #[arg(long)]
        pages: Option<u32>,
    },
    /// List past matching runs
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct MatchOverrides {
    #[arg(long)]
    pub min_score: Option<f64>,
    #[arg(long)]
    pub max_jobs: Option<usize>,
    /// Evaluate one job per oracle call, with reasons and concerns
    #[arg(long)]
    pub single: bool,
}

impl MatchOverrides {
    /// Copy of `config` with the command-line overrides applied.
    pub fn apply(&self, config: &ConfigManager) -> Result<ConfigManager> {
        let mut config = config.clone();

        if let Some(min_score) = self.min_score {
            if !(0.0..=100.0).contains(&min_score) {
                anyhow::bail!("--min-score must be between 0 and 100, got {}", min_score);
            }
            config.matching.min_score = min_score;
        }
        if let Some(max_jobs) = self.max_jobs {
            if max_jobs == 0 {
                anyhow::bail!("--max-jobs must be at least 1");
            }
            config.matching.max_jobs = max_jobs;
        }
        if self.single {
            config.matching.scoring_mode = ScoringMode::Single;
        }

        Ok(config)
    }
}

pub async fn handle_command(cli: Cli, config: ConfigManager) -> Result<()> {
    match cli.command {
        Command::Extract { files } => {
            let extraction = Extraction::from_config(&config);
            let artifact = if files.is_empty() {
                extraction
                    .extract_directory(&config.environment.html_path)
                    .await?
            } else {
                extraction.extract_files(&files).await?
            };
            println!("{}", artifact.display());
        }

        Command::Match { jobs, overrides } => {
            let config = overrides.apply(&config)?;
            let pipeline = MatchingPipeline::from_config(&config);
            let run = match jobs {
                Some(artifact) => pipeline.match_artifact(&artifact, &config.user_profile).await?,
                None => pipeline.match_latest(&config.user_profile).await?,
            };
            print_run(&run);
        }

        Command::Run { files, overrides } => {
            let config = overrides.apply(&config)?;
            let pipeline = MatchingPipeline::from_config(&config);
            let run = if files.is_empty() {
                let artifact = pipeline
                    .extraction()
                    .extract_directory(&config.environment.html_path)
                    .await?;
                pipeline.match_artifact(&artifact, &config.user_profile).await?
            } else {
                pipeline.run(&files, &config.user_profile).await?
            };
            print_run(&run);
        }

        Command::Fetch { url, pages } => {
            let mut request = FetchRequest::new(url, &config.fetch);
            if let Some(pages) = pages {
                request = request.with_max_pages(pages);
            }

            let fetcher = PageFetcher::new(&config.fetch, &config.environment.html_path)?;
            for path in fetcher.fetch_listing(&request).await? {
                println!("{}", path.display());
            }
        }

        Command::History { limit } => {
            let history = list_history(&config.environment.matches_path, limit).await?;
            if history.is_empty() {
                info!("No matching runs found in {}", config.environment.matches_path.display());
            }
            for entry in history {
                println!(
                    "{}  {} recommended  {}  {}",
                    entry.run_timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.recommended,
                    entry.top_title.as_deref().unwrap_or("-"),
                    entry.path.display()
                );
            }
        }
    }

    Ok(())
}

fn print_run(run: &MatchRun) {
    println!(
        "{} evaluated, {} filtered out, {} recommended",
        run.stats.total, run.stats.filtered_out, run.stats.recommended
    );
    for (rank, entry) in run.outcome.ranked.iter().enumerate() {
        println!(
            "{:>2}. [{:5.1}] {} ({})",
            rank + 1,
            entry.relevance_score,
            entry.job.title,
            entry.job.url.as_deref().unwrap_or("no link")
        );
    }
    println!("Results: {}", run.artifacts.results.display());
    println!("Ledger:  {}", run.artifacts.ledger.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ConfigFile;
    use std::path::Path;

    fn config() -> ConfigManager {
        let file = ConfigFile::parse(
            r#"
local:
  html_path: html
  jobs_path: jobs
  matches_path: matches
  log_path: logs
production:
  html_path: html
  jobs_path: jobs
  matches_path: matches
  log_path: logs
"#,
        )
        .unwrap();
        ConfigManager::from_file(file, "local", Path::new("/tmp/jm"))
    }

    #[test]
    fn test_parse_match_with_overrides() {
        let cli = Cli::try_parse_from([
            "job-matcher",
            "match",
            "--jobs",
            "jobs/extracted_jobs_1.json",
            "--min-score",
            "60",
            "--single",
        ])
        .unwrap();

        match cli.command {
            Command::Match { jobs, overrides } => {
                assert_eq!(jobs, Some(PathBuf::from("jobs/extracted_jobs_1.json")));
                assert_eq!(overrides.min_score, Some(60.0));
                assert!(overrides.single);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["job-matcher", "run", "a.html", "--config", "other.yaml"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("other.yaml"));
        assert!(matches!(cli.command, Command::Run { ref files, .. } if files.len() == 1));
    }

    #[test]
    fn test_overrides_do_not_touch_loaded_config() {
        let base = config();
        let overrides = MatchOverrides {
            min_score: Some(50.0),
            max_jobs: Some(2),
            single: true,
        };

        let applied = overrides.apply(&base).unwrap();
        assert_eq!(applied.matching.min_score, 50.0);
        assert_eq!(applied.matching.max_jobs, 2);
        assert_eq!(applied.matching.scoring_mode, ScoringMode::Single);
        assert_eq!(base.matching.min_score, 70.0);
        assert_eq!(base.matching.scoring_mode, ScoringMode::Batch);
    }

    #[test]
    fn test_overrides_reject_out_of_range_values() {
        let base = config();
        let bad_score = MatchOverrides {
            min_score: Some(120.0),
            ..MatchOverrides::default()
        };
        assert!(bad_score.apply(&base).is_err());

        let no_jobs = MatchOverrides {
            max_jobs: Some(0),
            ..MatchOverrides::default()
        };
        assert!(no_jobs.apply(&base).is_err());
    }

    #[tokio::test]
    async fn test_extract_command_does_not_need_api_key() {
        let tmp = tempfile::tempdir().unwrap();
        let file = ConfigFile::parse(
            r#"
local:
  html_path: html
  jobs_path: jobs
  matches_path: matches
  log_path: logs
production:
  html_path: html
  jobs_path: jobs
  matches_path: matches
  log_path: logs
oracle:
  api_key_env: JOB_MATCHER_TEST_UNSET_API_KEY
"#,
        )
        .unwrap();
        let config = ConfigManager::from_file(file, "local", tmp.path());
        std::fs::create_dir_all(&config.environment.html_path).unwrap();
        std::fs::write(
            config.environment.html_path.join("page.html"),
            r#"<div class="UNzN7"><a href="/jobs/1">Bot</a><div class="rGkuO">Acme掲載日：2025年06月20日</div></div>"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from(["job-matcher", "extract"]).unwrap();
        handle_command(cli, config.clone()).await.unwrap();

        let artifacts = std::fs::read_dir(&config.environment.jobs_path).unwrap().count();
        assert_eq!(artifacts, 1);
    }
}
