//! Claude backend over the Anthropic Messages API
//!
//! Single request/response calls (`POST {endpoint}/v1/messages`). Any
//! non-success status or unparsable body is an error.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use voice_shop_config::constants::{endpoints, env_vars, llm as llm_defaults, timeouts};

use crate::backend::{FinishReason, GenerationOptions, GenerationResult, LlmBackend};
use crate::prompt::{Message, Role};
use crate::LlmError;

/// Anthropic connection settings
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    /// Model id, e.g. `claude-3-5-sonnet-20241022`
    pub model: String,
    /// Used when a call does not set its own temperature
    pub temperature: f32,
    pub timeout: Duration,
    /// API root without the `/v1/messages` path
    pub endpoint: String,
    /// Value of the `anthropic-version` header
    pub api_version: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: llm_defaults::DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            timeout: Duration::from_millis(timeouts::LLM_REQUEST_MS),
            endpoint: endpoints::ANTHROPIC_DEFAULT.to_string(),
            api_version: llm_defaults::API_VERSION.to_string(),
        }
    }
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Build from loaded settings, `None` when no API key is set
    pub fn from_settings(settings: &voice_shop_config::LlmConfig) -> Option<Self> {
        let key = settings.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        Some(Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: Duration::from_millis(settings.timeout_ms),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            ..Self::new(key)
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.endpoint)
    }
}

/// Claude over the Messages API
pub struct ClaudeBackend {
    http: Client,
    config: ClaudeConfig,
}

impl ClaudeBackend {
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(format!(
                "{} is not set",
                env_vars::ANTHROPIC_API_KEY
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// System turns are folded into the top-level `system` field
    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &GenerationOptions,
    ) -> wire::MessagesRequest<'a> {
        let (system, turns): (Vec<&Message>, Vec<&Message>) =
            messages.iter().partition(|m| m.role == Role::System);
        let system = system
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        wire::MessagesRequest {
            model: &self.config.model,
            max_tokens: options.max_tokens,
            system: (!system.is_empty()).then_some(system),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            messages: turns
                .into_iter()
                .map(|m| wire::Turn {
                    role: if m.role == Role::Assistant { "assistant" } else { "user" },
                    content: &m.content,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LlmBackend for ClaudeBackend {
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<GenerationResult, LlmError> {
        let started = Instant::now();

        let response = self
            .http
            .post(self.config.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&self.build_request(messages, options))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, detail)));
        }

        let body: wire::MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            model = %self.config.model,
            output_tokens = body.usage.output_tokens,
            elapsed_ms,
            "Claude completion"
        );

        Ok(body.into_result(elapsed_ms))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Messages API request and response bodies
mod wire {
    use super::*;

    #[derive(Debug, Serialize)]
    pub(super) struct MessagesRequest<'a> {
        pub model: &'a str,
        pub max_tokens: u32,
        pub messages: Vec<Turn<'a>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub system: Option<String>,
        pub temperature: f32,
    }

    #[derive(Debug, Serialize)]
    pub(super) struct Turn<'a> {
        pub role: &'static str,
        pub content: &'a str,
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub(super) enum Block {
        Text { text: String },
        #[serde(other)]
        Unsupported,
    }

    #[derive(Debug, Deserialize)]
    pub(super) struct MessagesResponse {
        pub content: Vec<Block>,
        #[serde(default)]
        pub stop_reason: Option<String>,
        #[serde(default)]
        pub usage: Usage,
    }

    #[derive(Debug, Default, Deserialize)]
    pub(super) struct Usage {
        #[serde(default)]
        pub output_tokens: usize,
    }

    impl MessagesResponse {
        /// Concatenate the text blocks; other block kinds are skipped
        pub fn into_result(self, elapsed_ms: u64) -> GenerationResult {
            let finish_reason = match self.stop_reason.as_deref() {
                Some("max_tokens") => FinishReason::Length,
                _ => FinishReason::Stop,
            };
            let text = self
                .content
                .into_iter()
                .filter_map(|block| match block {
                    Block::Text { text } => Some(text),
                    Block::Unsupported => None,
                })
                .collect();

            GenerationResult {
                text,
                tokens: self.usage.output_tokens,
                total_time_ms: elapsed_ms,
                finish_reason,
            }
        }
    }
}
