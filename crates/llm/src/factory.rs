//! Backend selection from settings

use std::sync::Arc;

use crate::backend::{DisabledBackend, LlmBackend};
use crate::claude::{ClaudeBackend, ClaudeConfig};
use crate::LlmError;

/// Create the configured backend
///
/// Without an API key the [`DisabledBackend`] is returned, so the server still
/// starts and every turn runs on fallback replies.
pub fn create_backend(
    settings: &voice_shop_config::LlmConfig,
) -> Result<Arc<dyn LlmBackend>, LlmError> {
    match ClaudeConfig::from_settings(settings) {
        Some(config) => {
            tracing::info!(model = %config.model, "Using Claude LLM backend");
            Ok(Arc::new(ClaudeBackend::new(config)?))
        }
        None => {
            tracing::warn!("LLM API key missing, using disabled backend");
            Ok(Arc::new(DisabledBackend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_key() {
        let backend = create_backend(&voice_shop_config::LlmConfig::default()).unwrap();
        assert_eq!(backend.model_name(), "disabled");
    }

    #[test]
    fn test_claude_with_key() {
        let settings = voice_shop_config::LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let backend = create_backend(&settings).unwrap();
        assert_eq!(backend.model_name(), settings.model);
    }
}
