//! Intent classification
//!
//! One bounded LLM call per transcript. Whatever goes wrong (transport
//! failure, prose instead of JSON, unknown action) the classifier answers
//! with [`Intent::fallback`] so the turn can continue.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use voice_shop_config::constants::llm as llm_defaults;
use voice_shop_core::{Action, Intent, Tone};
use voice_shop_llm::{intent_prompt, GenerationOptions, LlmBackend};
use voice_shop_text_processing::{extract_price_filter, normalize_keywords};

/// LLM classification output before validation
#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(default, alias = "intent")]
    action: Option<String>,
    #[serde(default, alias = "search_query")]
    keywords: Option<String>,
    #[serde(default)]
    price_min: Option<Value>,
    #[serde(default)]
    price_max: Option<Value>,
    #[serde(default)]
    specific_product: Option<String>,
    #[serde(default)]
    comparison_targets: Option<Vec<String>>,
    #[serde(default, alias = "response_tone")]
    tone: Option<String>,
}

/// Strip a surrounding Markdown code fence, if any
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Non-negative integer bound; anything else is no bound
fn bound(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return u32::try_from(u).ok();
            }
            let f = n.as_f64()?;
            if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
                Some(f as u32)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse an LLM classification reply
///
/// Returns `None` when the reply is not a single JSON object or names an
/// unknown action. Missing price bounds are filled from `transcript`.
pub fn parse_intent(raw: &str, transcript: &str) -> Option<Intent> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).ok()?;
    if !value.is_object() {
        return None;
    }
    let parsed: RawIntent = serde_json::from_value(value).ok()?;

    let action = match non_empty(parsed.action) {
        Some(action) => Action::parse(&action)?,
        None => Action::Search,
    };

    let from_text = extract_price_filter(transcript);
    let price_min = bound(parsed.price_min.as_ref()).or(from_text.min);
    let price_max = bound(parsed.price_max.as_ref()).or(from_text.max);

    let mut keywords = non_empty(parsed.keywords).unwrap_or_default();
    if keywords.is_empty() && action.needs_search() {
        keywords = normalize_keywords(transcript);
    }

    Some(Intent {
        action,
        keywords,
        price_min,
        price_max,
        specific_product: non_empty(parsed.specific_product),
        comparison_targets: parsed
            .comparison_targets
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        tone: parsed.tone.as_deref().map(Tone::parse).unwrap_or_default(),
    })
}

/// Transcript to intent classifier
pub struct IntentClassifier {
    llm: Arc<dyn LlmBackend>,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            llm,
            max_tokens: llm_defaults::INTENT_MAX_TOKENS,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Classify a transcript. Never fails.
    pub async fn classify(&self, transcript: &str) -> Intent {
        let mut options = GenerationOptions::with_max_tokens(self.max_tokens);
        if let Some(t) = self.temperature {
            options = options.temperature(t);
        }

        let reply = match self.llm.generate(&intent_prompt(transcript), &options).await {
            Ok(result) => result.text,
            Err(e) => {
                tracing::warn!(error = %e, "Intent classification request failed, using fallback");
                return Self::fallback(transcript);
            }
        };

        match parse_intent(&reply, transcript) {
            Some(intent) => {
                tracing::debug!(
                    action = intent.action.as_str(),
                    keywords = %intent.keywords,
                    "Classified intent"
                );
                intent
            }
            None => {
                tracing::warn!(reply = %reply, "Unparsable intent reply, using fallback");
                Self::fallback(transcript)
            }
        }
    }

    fn fallback(transcript: &str) -> Intent {
        metrics::counter!("voice_shop_llm_fallback_total", "stage" => "intent").increment(1);
        Intent::fallback(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use voice_shop_llm::{FinishReason, GenerationResult, LlmError, Message};

    struct Canned(Result<String, ()>);

    #[async_trait]
    impl LlmBackend for Canned {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: &GenerationOptions,
        ) -> Result<GenerationResult, LlmError> {
            match &self.0 {
                Ok(text) => Ok(GenerationResult {
                    text: text.clone(),
                    tokens: 0,
                    total_time_ms: 0,
                    finish_reason: FinishReason::Stop,
                }),
                Err(()) => Err(LlmError::Network("connection reset".into())),
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn classifier(reply: Result<&str, ()>) -> IntentClassifier {
        IntentClassifier::new(Arc::new(Canned(reply.map(str::to_string))))
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {} "), "{}");
    }

    #[test]
    fn test_bounds_validation() {
        assert_eq!(bound(Some(&serde_json::json!(100))), Some(100));
        assert_eq!(bound(Some(&serde_json::json!(100.0))), Some(100));
        assert_eq!(bound(Some(&serde_json::json!("80"))), Some(80));
        assert_eq!(bound(Some(&serde_json::json!(-5))), None);
        assert_eq!(bound(Some(&serde_json::json!(99.5))), None);
        assert_eq!(bound(Some(&Value::Null)), None);
        assert_eq!(bound(None), None);
    }

    #[test]
    fn test_parse_full_reply() {
        let raw = r#"{"action":"search","keywords":"running shoes","price_min":null,
            "price_max":100,"specific_product":null,"comparison_targets":[],"tone":"enthusiastic"}"#;
        let intent = parse_intent(raw, "show me running shoes under 100 dollars").unwrap();
        assert_eq!(intent.action, Action::Search);
        assert_eq!(intent.keywords, "running shoes");
        assert_eq!(intent.price_max, Some(100));
        assert_eq!(intent.price_min, None);
        assert_eq!(intent.tone, Tone::Enthusiastic);
    }

    #[test]
    fn test_missing_bounds_filled_from_transcript() {
        let raw = r#"{"action":"search","keywords":"trail shoes"}"#;
        let intent = parse_intent(raw, "trail shoes between 50 and 80").unwrap();
        assert_eq!(intent.price_filter().min, Some(50));
        assert_eq!(intent.price_filter().max, Some(80));
    }

    #[test]
    fn test_llm_bounds_win() {
        let raw = r#"{"action":"search","keywords":"shoes","price_max":60}"#;
        let intent = parse_intent(raw, "shoes under 100").unwrap();
        assert_eq!(intent.price_max, Some(60));
    }

    #[test]
    fn test_empty_keywords_normalized_from_transcript() {
        let raw = r#"{"action":"search","keywords":""}"#;
        let intent = parse_intent(raw, "hiking boots under $120").unwrap();
        assert_eq!(intent.keywords, "hiking boots");

        let greeting = parse_intent(r#"{"action":"greeting"}"#, "hello there").unwrap();
        assert_eq!(greeting.keywords, "");
    }

    #[test]
    fn test_rejects_non_objects_and_unknown_actions() {
        assert!(parse_intent("Sure! Here are some shoes.", "x").is_none());
        assert!(parse_intent(r#"["search"]"#, "x").is_none());
        assert!(parse_intent(r#"{"action":"dance"}"#, "x").is_none());
    }

    #[tokio::test]
    async fn test_non_json_reply_falls_back() {
        let text = "show me running shoes under 100 dollars";
        let intent = classifier(Ok("I think you want shoes")).classify(text).await;
        assert_eq!(intent, Intent::fallback(text));
        assert_eq!(intent.keywords, text);
        assert_eq!(intent.tone, Tone::Helpful);
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        let intent = classifier(Err(())).classify("cloud pro").await;
        assert_eq!(intent.action, Action::Search);
        assert_eq!(intent.keywords, "cloud pro");
    }

    #[tokio::test]
    async fn test_fenced_reply_is_parsed() {
        let reply = "```json\n{\"action\":\"compare\",\"comparison_targets\":[\"cloud pro\",\" \"]}\n```";
        let intent = classifier(Ok(reply)).classify("compare the cloud pro").await;
        assert_eq!(intent.action, Action::Compare);
        assert_eq!(intent.comparison_targets, vec!["cloud pro"]);
    }
}
