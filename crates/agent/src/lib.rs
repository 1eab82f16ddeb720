//! Turn handling for the voice shopping assistant
//!
//! Features:
//! - Intent classification with a deterministic fallback
//! - Spoken reply composition under tone and length limits
//! - Per-session stream controller with welcome dedupe and ordered events
//! - Single-slot transcript relay for pull-style consumers
//! - In-memory per-session carts
//! - Keyword routing for the non-streaming voice endpoint

pub mod cart;
pub mod classifier;
pub mod composer;
pub mod controller;
pub mod registry;
pub mod relay;
pub mod router;

pub use cart::CartStore;
pub use classifier::{parse_intent, IntentClassifier};
pub use composer::{provisional_reply, ResponseComposer, TurnOutcome};
pub use controller::{ControllerConfig, EventDisposition, SessionEvent, StreamController};
pub use registry::{RegistryConfig, SessionRegistry, SessionSnapshot, TurnState};
pub use relay::TranscriptRelay;
pub use router::{KeywordRouter, RoutedAction};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Turn aborted: {0}")]
    TurnAborted(String),

    #[error(transparent)]
    Core(#[from] voice_shop_core::Error),
}

impl From<voice_shop_llm::LlmError> for AgentError {
    fn from(err: voice_shop_llm::LlmError) -> Self {
        AgentError::Core(err.into())
    }
}

impl From<voice_shop_search::SearchError> for AgentError {
    fn from(err: voice_shop_search::SearchError) -> Self {
        AgentError::Core(err.into())
    }
}

impl From<AgentError> for voice_shop_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Core(e) => e,
            other => voice_shop_core::Error::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: AgentError = voice_shop_llm::LlmError::Timeout.into();
        assert!(matches!(err, AgentError::Core(voice_shop_core::Error::Llm(_))));

        let core: voice_shop_core::Error =
            AgentError::Core(voice_shop_core::Error::InvalidInput("empty".into())).into();
        assert!(matches!(core, voice_shop_core::Error::InvalidInput(_)));

        let core: voice_shop_core::Error = AgentError::TurnAborted("panic".into()).into();
        assert!(matches!(core, voice_shop_core::Error::Internal(_)));
    }
}
