// src/oracle/ollama.rs
//! Adapter for a local Ollama server (`/api/chat`, non-streaming).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{http_client, Oracle, OracleError, OracleReply, OracleRequest};
use crate::core::config_manager::OracleConfig;

const CHAT_ENDPOINT: &str = "/api/chat";

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    role: String,
    content: String,
}

pub struct OllamaOracle {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Oracle for OllamaOracle {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let url = format!("{}{}", self.base_url, CHAT_ENDPOINT);

        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![
                OllamaMessage {
                    role: "system",
                    content: &request.system,
                },
                OllamaMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            stream: false,
            format: request.structured.then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature,
            },
        };

        debug!("Calling Ollama chat: {}", url);

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Ollama error {}: {}", status, message);
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let parsed: OllamaChatResponse = serde_json::from_str(&text)?;

        Ok(OracleReply {
            role: parsed.message.role,
            content: parsed.message.content,
            finish_reason: parsed.done_reason,
        })
    }
}
