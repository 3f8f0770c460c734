use anyhow::Result;
use clap::Parser;
use job_matcher::cli::{handle_command, Cli};
use job_matcher::core::ConfigManager;
use job_matcher::utils::open_log_file;
use std::sync::Mutex;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE: &str = "job_matcher.log";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging needs the configured log directory, so configuration comes first
    let config = ConfigManager::load(&cli.config)?;
    let (file, log_path) = open_log_file(&config.environment.log_path, LOG_FILE)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Loaded {} for environment: {}", cli.config.display(), config.environment_name);
    info!("Log file: {}", log_path.display());

    config.ensure_directories().await?;

    handle_command(cli, config).await
}
