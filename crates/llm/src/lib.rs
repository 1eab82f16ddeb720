//! LLM integration for the voice shopping assistant
//!
//! Features:
//! - `LlmBackend` trait with per-call token budgets
//! - Claude backend over the Anthropic Messages API
//! - A disabled backend used when no API key is configured
//! - Prompts for intent classification and reply styling

pub mod backend;
pub mod claude;
pub mod factory;
pub mod prompt;

pub use backend::{DisabledBackend, FinishReason, GenerationOptions, GenerationResult, LlmBackend};
pub use claude::{ClaudeBackend, ClaudeConfig};
pub use factory::create_backend;
pub use prompt::{intent_prompt, reply_prompt, Message, PromptBuilder, ReplyContext, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for voice_shop_core::Error {
    fn from(err: LlmError) -> Self {
        voice_shop_core::Error::Llm(err.to_string())
    }
}
