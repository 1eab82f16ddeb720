//! Voice Shop Server
//!
//! HTTP surface of the voice shopping assistant: the voice transport webhook
//! (answered as Server-Sent Events), the transcript poll, the keyword
//! voice-process endpoint, health and metrics.

pub mod http;
pub mod metrics;
pub mod signature;
pub mod state;
pub mod webhook;

pub use http::create_router;
pub use metrics::init_metrics;
pub use signature::{sign_payload, verify_signature, SignatureError, SIGNATURE_HEADER};
pub use state::AppState;
pub use webhook::{ChannelSink, WebhookPayload};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status()
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<SignatureError> for ServerError {
    fn from(err: SignatureError) -> Self {
        ServerError::Unauthorized(err.to_string())
    }
}

impl From<voice_shop_llm::LlmError> for ServerError {
    fn from(err: voice_shop_llm::LlmError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<voice_shop_search::SearchError> for ServerError {
    fn from(err: voice_shop_search::SearchError) -> Self {
        ServerError::Internal(err.to_string())
    }
}
