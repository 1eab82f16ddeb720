//! Prometheus metrics
//!
//! Counters and histograms are recorded through the `metrics` facade in the
//! agent and search crates; this module installs the exporter and serves it.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Install the global Prometheus recorder
///
/// Returns `None` when a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_metrics();
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

fn describe_metrics() {
    metrics::describe_counter!("voice_shop_turns_total", "Message turns by outcome");
    metrics::describe_counter!("voice_shop_search_total", "Product searches by result source");
    metrics::describe_counter!(
        "voice_shop_llm_fallback_total",
        "LLM calls replaced by a deterministic fallback"
    );
    metrics::describe_histogram!(
        "voice_shop_turn_latency_ms",
        metrics::Unit::Milliseconds,
        "Message turn latency"
    );
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) if state.settings.observability.metrics_enabled => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
