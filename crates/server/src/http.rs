//! HTTP Endpoints
//!
//! Routes for the voice transport webhook and the shopping frontend.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use voice_shop_agent::RoutedAction;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::webhook::handle_webhook;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        .route("/api/layercode-webhook", post(handle_webhook))
        .route("/api/latest-transcript", get(latest_transcript))
        .route("/api/voice-process", post(voice_process))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns a permissive layer
/// - If cors_origins is empty, any origin is allowed
/// - Otherwise only the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, allowing any origin");
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        .allow_headers(Any)
}

async fn latest_transcript(State(state): State<AppState>) -> Json<serde_json::Value> {
    let body = match state.relay.fetch_latest() {
        Some(t) => serde_json::json!({
            "transcript": t.text,
            "timestamp": t.received_at.timestamp_millis(),
            "session_id": t.session_id,
            "turn_id": t.turn_id,
        }),
        None => serde_json::json!({ "transcript": null, "timestamp": null }),
    };
    Json(body)
}

#[derive(Debug, Deserialize)]
struct VoiceProcessRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

async fn voice_process(
    State(state): State<AppState>,
    request: Result<Json<VoiceProcessRequest>, JsonRejection>,
) -> Result<Json<RoutedAction>, ServerError> {
    let missing = || ServerError::InvalidRequest("Query is required".to_string());

    let Json(request) = request.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Unreadable voice-process body");
        missing()
    })?;
    let query = request
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(missing)?;

    let routed = state
        .router
        .route(&query, request.session_id.as_deref())
        .await;
    Ok(Json(routed))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let check = |ok: bool| if ok { "configured" } else { "missing" };
    let llm_ready = state.llm.is_available().await;

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "checks": {
                "llm": check(llm_ready),
                "catalog": check(state.orchestrator.has_catalog()),
                "vector": check(state.orchestrator.has_vector()),
            }
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;
    use voice_shop_config::Settings;
    use voice_shop_core::Transcript;
    use voice_shop_llm::DisabledBackend;
    use voice_shop_search::SearchOrchestrator;

    fn state() -> AppState {
        AppState::new(
            Settings::default(),
            Arc::new(DisabledBackend),
            Arc::new(SearchOrchestrator::offline()),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_missing_backends() {
        let response = create_router(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["llm"], "missing");
        assert_eq!(body["checks"]["catalog"], "missing");
        assert_eq!(body["checks"]["vector"], "missing");
    }

    #[tokio::test]
    async fn test_latest_transcript_shapes() {
        let state = state();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::get("/api/latest-transcript").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"transcript": null, "timestamp": null})
        );

        let transcript = Transcript::new("running shoes", "s1", "t1");
        let millis = transcript.received_at.timestamp_millis();
        state.relay.record(transcript);

        let response = app
            .oneshot(Request::get("/api/latest-transcript").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["transcript"], "running shoes");
        assert_eq!(body["timestamp"], millis);
        assert_eq!(body["session_id"], "s1");
        assert_eq!(body["turn_id"], "t1");
    }

    #[tokio::test]
    async fn test_voice_process_requires_query() {
        for body in ["{}", r#"{"query": "  "}"#, "not json"] {
            let response = create_router(state())
                .oneshot(
                    Request::post("/api/voice-process")
                        .header("content-type", "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(
                body_json(response).await,
                serde_json::json!({"error": "Query is required"})
            );
        }
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = create_router(state())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
