// src/oracle/mod.rs
//! LLM oracle interface. Every backend is hidden behind [`Oracle`] and
//! returns the same [`OracleReply`] shape; the backend is chosen once, from
//! configuration, by [`build_oracle`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::core::config_manager::{OracleBackend, OracleConfig};

pub mod ollama;
pub mod openai;

pub use ollama::OllamaOracle;
pub use openai::OpenAiCompatibleOracle;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("oracle returned empty content")]
    EmptyContent,

    #[error("oracle configuration error: {0}")]
    Configuration(String),
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    /// Ask the backend to constrain its output to a JSON object.
    pub structured: bool,
}

/// Backend-independent completion result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReply {
    pub role: String,
    pub content: String,
    pub finish_reason: Option<String>,
}

impl OracleReply {
    /// Deserialize the reply content as a JSON object of shape `T`.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, OracleError> {
        let text = strip_json_fences(&self.content);
        if text.is_empty() {
            return Err(OracleError::EmptyContent);
        }
        serde_json::from_str(text).map_err(OracleError::Parse)
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Short backend label used in logs.
    fn name(&self) -> &str;

    async fn complete(&self, request: &OracleRequest) -> Result<OracleReply, OracleError>;
}

/// Build the configured backend adapter.
pub fn build_oracle(config: &OracleConfig) -> Result<Arc<dyn Oracle>, OracleError> {
    info!(
        "Using {:?} oracle backend at {} (model {})",
        config.backend, config.base_url, config.model
    );

    let oracle: Arc<dyn Oracle> = match config.backend {
        OracleBackend::OpenaiCompatible => Arc::new(OpenAiCompatibleOracle::new(config)?),
        OracleBackend::Ollama => Arc::new(OllamaOracle::new(config)?),
    };
    Ok(oracle)
}

/// Stand-in for a backend that could not be set up. Every call fails with
/// the setup error, so the scorer records it against each job.
pub struct UnavailableOracle {
    reason: String,
}

impl UnavailableOracle {
    pub fn new(error: OracleError) -> Self {
        let reason = match error {
            OracleError::Configuration(message) => message,
            other => other.to_string(),
        };
        Self { reason }
    }
}

#[async_trait]
impl Oracle for UnavailableOracle {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _request: &OracleRequest) -> Result<OracleReply, OracleError> {
        Err(OracleError::Configuration(self.reason.clone()))
    }
}

pub(crate) fn http_client(config: &OracleConfig) -> Result<reqwest::Client, OracleError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(OracleError::Http)
}

/// Strips ```json ... ``` or ``` ... ``` fences some models wrap JSON in.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(|s| s.trim())
                .unwrap_or(stripped)
        }
        None => text,
    }
}
