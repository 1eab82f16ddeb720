//! LLM backend trait and shared result types

use async_trait::async_trait;

use crate::prompt::Message;
use crate::LlmError;

/// Per-call generation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature, `None` uses the backend default
    pub temperature: Option<f32>,
}

impl GenerationOptions {
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::with_max_tokens(512)
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    /// Tokens generated
    pub tokens: usize,
    /// Total generation time (ms)
    pub total_time_ms: u64,
    pub finish_reason: FinishReason,
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Error,
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a single completion
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<GenerationResult, LlmError>;

    /// Whether the backend can be called at all
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Backend used when no LLM is configured
///
/// Every call fails with [`LlmError::Configuration`], so callers take their
/// deterministic fallback path.
#[derive(Debug, Clone, Default)]
pub struct DisabledBackend;

#[async_trait]
impl LlmBackend for DisabledBackend {
    async fn generate(
        &self,
        _messages: &[Message],
        _options: &GenerationOptions,
    ) -> Result<GenerationResult, LlmError> {
        Err(LlmError::Configuration("no LLM backend configured".to_string()))
    }

    async fn is_available(&self) -> bool {
        false
    }

    fn model_name(&self) -> &str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_backend_always_fails() {
        let backend = DisabledBackend;
        let result = backend
            .generate(&[Message::user("hi")], &GenerationOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::Configuration(_))));
        assert!(!backend.is_available().await);
    }

    #[test]
    fn test_options_builder() {
        let options = GenerationOptions::with_max_tokens(1000).temperature(0.2);
        assert_eq!(options.max_tokens, 1000);
        assert_eq!(options.temperature, Some(0.2));
    }
}
