//! Session stream controller
//!
//! Drives one event at a time per session:
//!
//! ```text
//! session.start ──▶ welcome (first time only) ──▶ end
//! message ──▶ thinking ──▶ [searching ──▶ search_complete] ──▶ tts ──▶ end
//! session.end ──▶ drop session state ──▶ end
//! anything else ──▶ end
//! ```
//!
//! Events for the same session are serialized by the registry's session
//! lock. Every event ends with exactly one end-of-turn marker, and a failed
//! turn still speaks an apology before it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use voice_shop_config::constants::{limits, llm as llm_defaults, session};
use voice_shop_core::{
    Action, Intent, PriceFilter, Product, ProgressMarker, SearchResult, Transcript,
    TurnSink,
};
use voice_shop_llm::LlmBackend;
use voice_shop_search::SearchOrchestrator;
use voice_shop_text_processing::extract_price_filter;

use crate::cart::CartStore;
use crate::classifier::IntentClassifier;
use crate::composer::{ResponseComposer, TurnOutcome};
use crate::registry::{SessionRegistry, TurnState};
use crate::relay::TranscriptRelay;
use crate::AgentError;

/// Inbound session event, already validated at the transport boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SessionStart {
        session_id: String,
    },
    Message {
        session_id: String,
        turn_id: String,
        text: String,
    },
    SessionEnd {
        session_id: String,
    },
    /// Any other event type; acknowledged without side effects
    Other {
        session_id: String,
        kind: String,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::SessionStart { session_id }
            | SessionEvent::Message { session_id, .. }
            | SessionEvent::SessionEnd { session_id }
            | SessionEvent::Other { session_id, .. } => session_id,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            SessionEvent::SessionStart { .. } => "session.start",
            SessionEvent::Message { .. } => "message",
            SessionEvent::SessionEnd { .. } => "session.end",
            SessionEvent::Other { kind, .. } => kind,
        }
    }
}

/// How an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Welcomed,
    AlreadyWelcomed,
    Turn { action: Action, degraded: bool },
    TurnFailed,
    /// Same transcript already processed within the duplicate window
    Duplicate,
    /// Empty message or unknown event type
    Ignored,
    Closed,
}

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub welcome_message: String,
    pub apology_message: String,
    pub intent_max_tokens: u32,
    pub reply_max_tokens: u32,
    pub reply_words: usize,
    pub temperature: Option<f32>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            welcome_message: session::WELCOME_MESSAGE.to_string(),
            apology_message: session::APOLOGY_MESSAGE.to_string(),
            intent_max_tokens: llm_defaults::INTENT_MAX_TOKENS,
            reply_max_tokens: llm_defaults::REPLY_MAX_TOKENS,
            reply_words: limits::REPLY_WORDS,
            temperature: None,
        }
    }
}

impl ControllerConfig {
    pub fn from_settings(settings: &voice_shop_config::Settings) -> Self {
        Self {
            welcome_message: settings.session.welcome_message.clone(),
            intent_max_tokens: settings.llm.intent_max_tokens,
            reply_max_tokens: settings.llm.reply_max_tokens,
            temperature: Some(settings.llm.temperature),
            ..Self::default()
        }
    }
}

struct TurnReport {
    action: Action,
    degraded: bool,
    speech: String,
}

/// Per-session turn state machine
pub struct StreamController {
    classifier: IntentClassifier,
    composer: ResponseComposer,
    orchestrator: Arc<SearchOrchestrator>,
    registry: Arc<SessionRegistry>,
    relay: Arc<TranscriptRelay>,
    carts: Arc<CartStore>,
    config: ControllerConfig,
}

impl StreamController {
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        orchestrator: Arc<SearchOrchestrator>,
        registry: Arc<SessionRegistry>,
        relay: Arc<TranscriptRelay>,
        carts: Arc<CartStore>,
        config: ControllerConfig,
    ) -> Self {
        let mut classifier =
            IntentClassifier::new(Arc::clone(&llm)).with_max_tokens(config.intent_max_tokens);
        let mut composer = ResponseComposer::new(llm)
            .with_max_tokens(config.reply_max_tokens)
            .with_max_words(config.reply_words);
        if let Some(t) = config.temperature {
            classifier = classifier.with_temperature(t);
            composer = composer.with_temperature(t);
        }

        Self {
            classifier,
            composer,
            orchestrator,
            registry,
            relay,
            carts,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn relay(&self) -> &Arc<TranscriptRelay> {
        &self.relay
    }

    pub fn carts(&self) -> &Arc<CartStore> {
        &self.carts
    }

    pub fn orchestrator(&self) -> &Arc<SearchOrchestrator> {
        &self.orchestrator
    }

    /// Handle one event, emitting its events to `sink`
    pub async fn handle(&self, event: SessionEvent, sink: &dyn TurnSink) -> EventDisposition {
        let lock = self.registry.session_lock(event.session_id());
        let _guard = lock.lock().await;

        tracing::debug!(
            session_id = event.session_id(),
            event = event.kind(),
            "Handling session event"
        );

        let disposition = match event {
            SessionEvent::SessionStart { session_id } => self.on_session_start(&session_id, sink),
            SessionEvent::Message {
                session_id,
                turn_id,
                text,
            } => {
                self.on_message(Transcript::new(text, session_id, turn_id), sink)
                    .await
            }
            SessionEvent::SessionEnd { session_id } => {
                self.registry.remove(&session_id);
                self.carts.clear(&session_id);
                tracing::info!(session_id = %session_id, "Session closed");
                EventDisposition::Closed
            }
            SessionEvent::Other { session_id, kind } => {
                tracing::debug!(session_id = %session_id, kind = %kind, "Acknowledging event");
                EventDisposition::Ignored
            }
        };

        sink.end();
        disposition
    }

    fn on_session_start(&self, session_id: &str, sink: &dyn TurnSink) -> EventDisposition {
        if self.registry.try_welcome(session_id) {
            tracing::info!(session_id, "Welcoming new session");
            sink.tts(&self.config.welcome_message);
            EventDisposition::Welcomed
        } else {
            tracing::debug!(session_id, "Session already welcomed");
            EventDisposition::AlreadyWelcomed
        }
    }

    async fn on_message(&self, transcript: Transcript, sink: &dyn TurnSink) -> EventDisposition {
        if transcript.text.trim().is_empty() {
            return EventDisposition::Ignored;
        }
        if !self.registry.mark_processed(&transcript) {
            tracing::info!(
                session_id = %transcript.session_id,
                turn_id = %transcript.turn_id,
                "Duplicate transcript ignored"
            );
            return EventDisposition::Duplicate;
        }

        self.relay.record(transcript.clone());
        self.registry
            .set_state(&transcript.session_id, TurnState::StreamingTurn);

        let started = Instant::now();
        sink.data(ProgressMarker::Thinking);

        let result = AssertUnwindSafe(self.run_turn(&transcript, sink))
            .catch_unwind()
            .await
            .map_err(|panic| AgentError::TurnAborted(panic_message(panic.as_ref())));

        let disposition = match result {
            Ok(report) => {
                sink.tts(&report.speech);
                metrics::counter!("voice_shop_turns_total", "outcome" => "ok").increment(1);
                tracing::info!(
                    session_id = %transcript.session_id,
                    turn_id = %transcript.turn_id,
                    action = report.action.as_str(),
                    degraded = report.degraded,
                    "Turn completed"
                );
                EventDisposition::Turn {
                    action: report.action,
                    degraded: report.degraded,
                }
            }
            Err(e) => {
                tracing::error!(
                    session_id = %transcript.session_id,
                    turn_id = %transcript.turn_id,
                    error = %e,
                    "Turn failed"
                );
                sink.data(ProgressMarker::Error {
                    message: e.to_string(),
                });
                sink.tts(&self.config.apology_message);
                metrics::counter!("voice_shop_turns_total", "outcome" => "error").increment(1);
                EventDisposition::TurnFailed
            }
        };

        metrics::histogram!("voice_shop_turn_latency_ms")
            .record(started.elapsed().as_secs_f64() * 1000.0);
        self.registry.set_state(&transcript.session_id, TurnState::Idle);
        disposition
    }

    async fn run_turn(&self, transcript: &Transcript, sink: &dyn TurnSink) -> TurnReport {
        let session_id = transcript.session_id.as_str();
        let intent = self.classifier.classify(&transcript.text).await;

        let outcome = match intent.action {
            Action::Search => {
                sink.data(ProgressMarker::Searching {
                    query: intent.keywords.clone(),
                });
                let query = intent
                    .query()
                    .with_filter(price_bounds(&intent, &transcript.text));
                let result = self.orchestrator.search(&query).await;
                if !result.is_degraded() {
                    self.remember(session_id, result.first());
                }
                Self::search_complete(sink, Action::Search, &result);
                TurnOutcome::Searched(result)
            }
            Action::ShowProduct => {
                let product = self.look_up(&intent, &transcript.text, sink).await;
                self.remember(session_id, product.as_ref());
                TurnOutcome::Product(product)
            }
            Action::Compare => {
                let result = self.compare(&intent, &transcript.text, sink).await;
                self.remember(session_id, result.first());
                TurnOutcome::Compared(result)
            }
            Action::AddToCart => self.add_to_cart(&intent, session_id, sink).await,
            Action::Greeting => TurnOutcome::Greeting,
            Action::Help => TurnOutcome::Help,
        };

        let degraded = matches!(&outcome, TurnOutcome::Searched(r) if r.is_degraded());
        let speech = self.composer.compose(&transcript.text, &intent, &outcome).await;

        TurnReport {
            action: intent.action,
            degraded,
            speech,
        }
    }

    /// Product detail lookup with progress markers
    async fn look_up(&self, intent: &Intent, text: &str, sink: &dyn TurnSink) -> Option<Product> {
        let subject = intent.specific_product.as_deref().unwrap_or(text);
        sink.data(ProgressMarker::Searching {
            query: subject.to_string(),
        });
        let product = self.orchestrator.show_product(subject).await;
        Self::search_complete(
            sink,
            Action::ShowProduct,
            &SearchResult::catalog(product.iter().cloned().collect()),
        );
        product
    }

    async fn compare(&self, intent: &Intent, text: &str, sink: &dyn TurnSink) -> SearchResult {
        let filter = price_bounds(intent, text);
        let result = if intent.comparison_targets.is_empty() {
            sink.data(ProgressMarker::Searching {
                query: text.to_string(),
            });
            self.orchestrator.compare(text, filter).await
        } else {
            sink.data(ProgressMarker::Searching {
                query: intent.comparison_targets.join(", "),
            });
            self.orchestrator
                .compare_subjects(&intent.comparison_targets, filter)
                .await
        };
        Self::search_complete(sink, Action::Compare, &result);
        result
    }

    async fn add_to_cart(&self, intent: &Intent, session_id: &str, sink: &dyn TurnSink) -> TurnOutcome {
        let mut product = self.registry.last_product(session_id);
        if product.is_none() {
            if let Some(name) = intent.specific_product.as_deref() {
                product = self.look_up(intent, name, sink).await;
            }
        }

        match product {
            Some(product) => {
                self.registry.remember_product(session_id, product.clone());
                let cart_size = self.carts.add(session_id, product.clone());
                TurnOutcome::AddedToCart {
                    product: Some(product),
                    cart_size,
                }
            }
            None => {
                tracing::info!(session_id, "Nothing to add to cart");
                TurnOutcome::AddedToCart {
                    product: None,
                    cart_size: self.carts.len(session_id),
                }
            }
        }
    }

    fn remember(&self, session_id: &str, product: Option<&Product>) {
        if let Some(product) = product {
            self.registry.remember_product(session_id, product.clone());
        }
    }

    fn search_complete(sink: &dyn TurnSink, action: Action, result: &SearchResult) {
        sink.data(ProgressMarker::SearchComplete {
            action,
            count: result.len(),
            preview: result.preview().to_vec(),
            degraded: result.is_degraded(),
        });
    }
}

/// Intent bounds, with unset ones taken from the spoken text
fn price_bounds(intent: &Intent, text: &str) -> PriceFilter {
    intent.price_filter().or(extract_price_filter(text))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "turn panicked".to_string()
    }
}
