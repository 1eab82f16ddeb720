//! Voice transport webhook
//!
//! Each delivery is answered with an SSE stream carrying the controller's
//! events for that delivery, closed after `response.end`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use voice_shop_agent::SessionEvent;
use voice_shop_core::{StreamEvent, TurnSink};

use crate::signature::{verify_signature, SIGNATURE_HEADER};
use crate::state::AppState;
use crate::ServerError;

/// Inbound webhook body
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub turn_id: Option<String>,
}

impl WebhookPayload {
    /// Validate and convert into a controller event
    pub fn into_event(self) -> Result<SessionEvent, ServerError> {
        let session_id = self
            .session_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ServerError::InvalidRequest("session_id is required".to_string()))?;

        let event = match self.kind.as_str() {
            "session.start" => SessionEvent::SessionStart { session_id },
            "message" | "user_message" => SessionEvent::Message {
                session_id,
                turn_id: self
                    .turn_id
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| ServerError::InvalidRequest("turn_id is required".to_string()))?,
                text: self.text.unwrap_or_default(),
            },
            "session.end" => SessionEvent::SessionEnd { session_id },
            _ => SessionEvent::Other {
                session_id,
                kind: self.kind,
            },
        };
        Ok(event)
    }
}

/// Turn sink feeding an SSE response
///
/// Events sent after the client disconnected are dropped.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TurnSink for ChannelSink {
    fn send(&self, event: StreamEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("SSE consumer gone, dropping event");
        }
    }
}

fn to_sse(event: StreamEvent) -> Option<Result<Event, Infallible>> {
    match Event::default().json_data(&event) {
        Ok(sse) => Some(Ok(sse)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode stream event");
            None
        }
    }
}

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServerError> {
    let webhook = &state.settings.webhook;
    if webhook.verify_signature {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        let secret = webhook.secret.as_deref().unwrap_or_default();
        verify_signature(
            header,
            &body,
            secret,
            webhook.tolerance_secs,
            chrono::Utc::now().timestamp(),
        )?;
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ServerError::InvalidRequest(format!("Invalid webhook payload: {}", e)))?;
    let event = payload.into_event()?;

    tracing::info!(
        session_id = %event.session_id(),
        event_type = %event.kind(),
        "Webhook received"
    );

    let (sink, rx) = ChannelSink::new();
    let controller = Arc::clone(&state.controller);
    // The turn runs to completion even if the client goes away.
    tokio::spawn(async move {
        let disposition = controller.handle(event, &sink).await;
        tracing::debug!(?disposition, "Webhook event handled");
    });

    let stream = UnboundedReceiverStream::new(rx).filter_map(to_sse);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_message_aliases() {
        for kind in ["message", "user_message"] {
            let event = payload(serde_json::json!({
                "type": kind, "text": "trail shoes", "session_id": "s1", "turn_id": "t1"
            }))
            .into_event()
            .unwrap();
            assert_eq!(
                event,
                SessionEvent::Message {
                    session_id: "s1".into(),
                    turn_id: "t1".into(),
                    text: "trail shoes".into()
                }
            );
        }
    }

    #[test]
    fn test_missing_session_id_rejected() {
        let err = payload(serde_json::json!({"type": "session.start"}))
            .into_event()
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));

        let err = payload(serde_json::json!({"type": "message", "session_id": "  "}))
            .into_event()
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));
    }

    #[test]
    fn test_missing_turn_id_rejected() {
        for body in [
            serde_json::json!({"type": "message", "text": "trail shoes", "session_id": "s1"}),
            serde_json::json!({"type": "user_message", "session_id": "s1", "turn_id": " "}),
        ] {
            let err = payload(body).into_event().unwrap_err();
            assert!(matches!(err, ServerError::InvalidRequest(ref m) if m == "turn_id is required"));
        }
    }

    #[test]
    fn test_missing_text_is_empty_message() {
        let event = payload(serde_json::json!({"type": "message", "session_id": "s1", "turn_id": "t9"}))
            .into_event()
            .unwrap();
        match event {
            SessionEvent::Message { turn_id, text, .. } => {
                assert_eq!(turn_id, "t9");
                assert!(text.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_other_event_kinds() {
        let event = payload(serde_json::json!({"type": "session.update", "session_id": "s1"}))
            .into_event()
            .unwrap();
        assert_eq!(event.kind(), "session.update");
        assert_eq!(
            payload(serde_json::json!({"type": "session.end", "session_id": "s1"}))
                .into_event()
                .unwrap(),
            SessionEvent::SessionEnd {
                session_id: "s1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_sink_after_consumer_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.tts("nobody listening");
        sink.end();
    }
}
