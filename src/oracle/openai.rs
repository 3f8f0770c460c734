// src/oracle/openai.rs
//! Adapter for OpenAI-compatible `/chat/completions` endpoints (OpenAI,
//! DeepSeek, and local servers exposing the same API).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{http_client, Oracle, OracleError, OracleReply, OracleRequest};
use crate::core::config_manager::OracleConfig;

const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct OpenAiCompatibleOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = match &config.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                OracleError::Configuration(format!("{} environment variable not set", var))
            })?),
            None => None,
        };

        Ok(Self {
            client: http_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Oracle for OpenAiCompatibleOracle {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn complete(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_ENDPOINT);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            response_format: request.structured.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        debug!("Calling chat completions: {}", url);

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            error!("Chat completions error {}: {}", status, message);
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(OracleError::EmptyContent)?;

        Ok(OracleReply {
            role: choice.message.role,
            content: choice.message.content.ok_or(OracleError::EmptyContent)?,
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_includes_json_mode_only_when_structured() {
        let structured = ChatRequest {
            model: "deepseek-chat",
            messages: vec![],
            temperature: 0.1,
            response_format: true.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };
        let value = serde_json::to_value(&structured).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");

        let plain = ChatRequest {
            response_format: None,
            ..structured
        };
        let value = serde_json::to_value(&plain).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_response_shape_parses() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"scores\":[]}"},"finish_reason":"stop"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.role, "assistant");
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("stop"));
    }
}
